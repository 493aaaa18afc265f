use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ogw_domain::config::{Config, ConfigSeverity, TransportMode};

use ogw_gateway::cli::{Cli, Command, ConfigCommand};
use ogw_gateway::{bootstrap, cli, transport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.display().to_string();

    match cli.command {
        // Default to serve when no subcommand is given (spec.md §6).
        None | Some(Command::Serve) => {
            init_tracing();
            let config = cli::load_config(&cli.config)?;
            if let Err(e) = run_server(config).await {
                tracing::error!(error = %e, "ogw-gateway exited with an unrecoverable error");
                std::process::exit(2);
            }
            Ok(())
        }
        Some(Command::Doctor) => {
            let config = cli::load_config(&cli.config)?;
            let passed = cli::doctor::run(&config, &config_path).await?;
            if !passed {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let config = cli::load_config(&cli.config)?;
            let valid = cli::config::validate(&config, &config_path);
            if !valid {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let config = cli::load_config(&cli.config)?;
            cli::config::show(&config);
            Ok(())
        }
    }
}

/// Structured JSON tracing, configured exactly once for the `serve`
/// subcommand (spec.md §4.0 "Logging & tracing").
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ogw_gateway=debug")))
        .json()
        .init();
}

/// Validates config, wires every component, and runs the configured
/// transport(s) until shutdown. Exit code 1 (configuration error) is
/// signalled by returning `Err` before any transport starts; exit code 2
/// (unrecoverable runtime error) by returning `Err` after.
async fn run_server(config: Config) -> anyhow::Result<()> {
    tracing::info!("ogw-gateway starting");

    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        std::process::exit(1);
    }

    let gateway = bootstrap::build(&config).context("bootstrapping gateway components")?;

    match config.server.transport {
        TransportMode::Stdio => transport::serve_stdio(gateway.dispatcher).await,
        TransportMode::Http => transport::serve_http(gateway.dispatcher, &config.server.host, config.server.port).await,
    }
}
