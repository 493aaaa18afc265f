use ogw_domain::config::{Config, ConfigSeverity};

/// Runs all diagnostic checks and prints a summary.
///
/// Returns `Ok(true)` when every check passes, `Ok(false)` when at least
/// one failed.
pub async fn run(config: &Config, config_path: &str) -> anyhow::Result<bool> {
    println!("ogw-gateway doctor");
    println!("==================\n");

    let mut all_passed = true;

    check_config_file(config_path, &mut all_passed);
    check_config_validation(config, &mut all_passed);
    check_credential(config, &mut all_passed);
    check_backend_reachable(config, &mut all_passed).await;

    println!();
    if all_passed {
        println!("All checks passed.");
    } else {
        println!("Some checks failed. Review the output above.");
    }

    Ok(all_passed)
}

fn check_config_file(config_path: &str, all_passed: &mut bool) {
    let exists = std::path::Path::new(config_path).exists();
    print_check(
        "Config file exists",
        exists,
        if exists { config_path.to_owned() } else { format!("{config_path} not found (using defaults)") },
    );
    if !exists {
        *all_passed = false;
    }
}

fn check_config_validation(config: &Config, all_passed: &mut bool) {
    let issues = config.validate();
    let error_count = issues.iter().filter(|i| i.severity == ConfigSeverity::Error).count();

    if issues.is_empty() {
        print_check("Config validation", true, "no issues".into());
    } else {
        print_check("Config validation", error_count == 0, format!("{} issue(s) ({error_count} error(s))", issues.len()));
        for issue in &issues {
            println!("      {issue}");
        }
        if error_count > 0 {
            *all_passed = false;
        }
    }
}

fn check_credential(config: &Config, all_passed: &mut bool) {
    let env_var = &config.backend.credential_env;
    let set = std::env::var(env_var).map(|v| !v.is_empty()).unwrap_or(false);
    print_check(
        "Backend credential set",
        set,
        if set { env_var.clone() } else { format!("{env_var} is unset or empty") },
    );
    if !set {
        *all_passed = false;
    }
}

async fn check_backend_reachable(config: &Config, all_passed: &mut bool) {
    let url = &config.backend.endpoint_url;
    let reachable = match reqwest::Client::builder().timeout(std::time::Duration::from_secs(5)).build() {
        Ok(client) => client.get(url).send().await.is_ok(),
        Err(_) => false,
    };

    print_check("Backend reachable", reachable, if reachable { url.clone() } else { format!("{url} (unreachable)") });
    if !reachable {
        *all_passed = false;
    }
}

fn print_check(name: &str, passed: bool, detail: String) {
    let status = if passed { "PASS" } else { "FAIL" };
    println!("  [{status}] {name}: {detail}");
}
