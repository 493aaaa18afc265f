//! End-to-end coverage through the real transport-agnostic path:
//! `bootstrap::build_with_transport` wired to a `MockBackend`, then
//! `Dispatcher::handle` exactly as `transport::serve_stdio`/`serve_http`
//! call it. These exercise the full component graph (rate limiter, cache,
//! sessions, discovery engine, query validator, tool registry) together
//! rather than any single crate in isolation.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use ogw_backend::MockBackend;
use ogw_domain::config::Config;
use ogw_gateway::bootstrap;

fn gateway(mock: Arc<MockBackend>) -> bootstrap::Gateway {
    gateway_with_config(mock, Config::default())
}

fn gateway_with_config(mock: Arc<MockBackend>, config: Config) -> bootstrap::Gateway {
    bootstrap::build_with_transport(&config, mock).expect("gateway bootstraps with a mock backend")
}

#[tokio::test]
async fn tools_list_returns_the_full_catalog() {
    let mock = Arc::new(MockBackend::new(json!({})));
    let gw = gateway(mock);

    let result = gw.dispatcher.handle("tools/list", &json!({}), None, None, Duration::from_secs(5)).await.unwrap();
    let names: Vec<&str> = result.as_array().unwrap().iter().map(|t| t["name"].as_str().unwrap()).collect();

    for expected in ["discovery.list_schemas", "query.execute", "dashboard.create", "alerts.manage", "session.set", "session.get"] {
        assert!(names.contains(&expected), "missing {expected} in tools/list: {names:?}");
    }
}

#[tokio::test]
async fn ping_reports_version_and_uptime() {
    let mock = Arc::new(MockBackend::new(json!({})));
    let gw = gateway(mock);

    let result = gw.dispatcher.handle("ping", &json!({}), None, None, Duration::from_secs(5)).await.unwrap();
    assert!(result["version"].is_string());
    assert!(result["uptime_secs"].is_u64());
}

/// Scenario A (spec.md §8): an unknown tool name gets a `method_not_found`
/// error whose hint names the closest registered tool.
#[tokio::test]
async fn scenario_a_unknown_tool_suggests_the_closest_match() {
    let mock = Arc::new(MockBackend::new(json!({})));
    let gw = gateway(mock);

    let params = json!({ "name": "discovry.list_schemas", "arguments": {} });
    let err = gw.dispatcher.handle("tools/call", &params, None, None, Duration::from_secs(5)).await.unwrap_err();

    assert_eq!(err.data.as_ref().unwrap().error_type, Some("method_not_found"));
    assert!(err.data.unwrap().hint.unwrap().contains("discovery.list_schemas"));
}

/// Scenario B (spec.md §8): a structurally invalid query is rejected with
/// an offset/token pointing at the offending clause, never reaching the
/// Backend.
#[tokio::test]
async fn scenario_b_invalid_query_reports_the_offending_token_without_calling_backend() {
    let mock = Arc::new(MockBackend::new(json!({})));
    let gw = gateway(mock.clone());

    let params = json!({ "name": "query.execute", "arguments": { "query": "SELECT count(*) FORM Transaction" } });
    let err = gw.dispatcher.handle("tools/call", &params, None, None, Duration::from_secs(5)).await.unwrap_err();

    let data = err.data.unwrap();
    assert_eq!(data.error_type, Some("validation_error"));
    let details = data.details.unwrap();
    assert_eq!(details["token"], "FORM");
    assert_eq!(mock.call_count(), 0);
}

/// Scenario C (spec.md §8): N concurrent identical calls to a cacheable
/// tool reach the Backend once; the rest are served from the single-flight
/// coalesce or the resulting cache entry.
#[tokio::test]
async fn scenario_c_concurrent_identical_calls_hit_the_backend_once() {
    let mock = Arc::new(MockBackend::new(json!({ "schemas": [{ "name": "Transaction", "count": 1000 }] })));
    let gw = Arc::new(gateway(mock.clone()));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let gw = gw.clone();
        handles.push(tokio::spawn(async move {
            let params = json!({ "name": "discovery.list_schemas", "arguments": { "window": "1 DAY AGO" } });
            gw.dispatcher.handle("tools/call", &params, None, None, Duration::from_secs(5)).await
        }));
    }
    let mut results = Vec::new();
    for h in handles {
        results.push(h.await.unwrap().unwrap());
    }

    assert_eq!(mock.call_count(), 1);
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

/// Scenario D (spec.md §8): once the circuit opens, further Backend calls
/// fail fast as `circuit_open` without reaching the mock.
#[tokio::test]
async fn scenario_d_repeated_backend_failures_open_the_circuit() {
    use ogw_backend::mock::Scripted;
    use ogw_domain::config::{CircuitBreakerConfig, RetryConfig};

    let mock = Arc::new(MockBackend::new(json!({ "schemas": [] })));
    mock.push_n(Scripted::HttpStatus(503), 5);

    // Retries disabled so each call attributes exactly one failure to the
    // breaker; otherwise a single call's own retries could trip the
    // threshold on their own, same as ogw-backend's resilient.rs unit test.
    let config = Config {
        circuit_breaker: CircuitBreakerConfig { failure_threshold: 5, cooldown_secs: 30 },
        retry: RetryConfig { max_retries: 0, base_delay_ms: 1, multiplier: 2.0, jitter_ratio: 0.0 },
        ..Config::default()
    };
    let gw = gateway_with_config(mock.clone(), config);

    for _ in 0..5 {
        let params = json!({ "name": "discovery.list_schemas", "arguments": { "window": format!("{} DAY AGO", rand_window()) } });
        let err = gw.dispatcher.handle("tools/call", &params, None, None, Duration::from_secs(5)).await.unwrap_err();
        assert_eq!(err.data.unwrap().error_type, Some("upstream_error"));
    }

    let params = json!({ "name": "discovery.list_schemas", "arguments": { "window": format!("{} DAY AGO", rand_window()) } });
    let err = gw.dispatcher.handle("tools/call", &params, None, None, Duration::from_secs(5)).await.unwrap_err();
    assert_eq!(err.data.unwrap().error_type, Some("circuit_open"));
    assert_eq!(mock.call_count(), 5);
}

/// Distinct, non-cacheable window strings so Scenario D's retries aren't
/// short-circuited by the single-flight cache coalescing on an identical key.
fn rand_window() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Scenario E (spec.md §8): a destructive tool without `dry_run`/`confirm`
/// is denied before the Backend is ever called; with `dry_run: true` it
/// returns a preview and still never calls the Backend.
#[tokio::test]
async fn scenario_e_destructive_tool_requires_dry_run_or_confirm() {
    let mock = Arc::new(MockBackend::new(json!({ "dashboardCreate": { "guid": "abc" } })));
    let gw = gateway(mock.clone());

    let denied_params = json!({ "name": "dashboard.create", "arguments": { "name": "My Dashboard" } });
    let err = gw.dispatcher.handle("tools/call", &denied_params, None, None, Duration::from_secs(5)).await.unwrap_err();
    assert_eq!(err.data.unwrap().error_type, Some("permission_denied"));
    assert_eq!(mock.call_count(), 0);

    let dry_run_params = json!({ "name": "dashboard.create", "arguments": { "name": "My Dashboard", "dry_run": true } });
    let result = gw.dispatcher.handle("tools/call", &dry_run_params, None, None, Duration::from_secs(5)).await.unwrap();
    assert_eq!(result["would_create"][0]["name"], "My Dashboard");
    assert_eq!(mock.call_count(), 0);

    let confirmed_params = json!({ "name": "dashboard.create", "arguments": { "name": "My Dashboard", "confirm": true } });
    gw.dispatcher.handle("tools/call", &confirmed_params, None, None, Duration::from_secs(5)).await.unwrap();
    assert_eq!(mock.call_count(), 1);
}

/// Scenario F (spec.md §8): session context set by one call is visible to
/// a later call in the same session, and reading a key that was never set
/// (or a session that has since been evicted) is `data_not_found`.
#[tokio::test]
async fn scenario_f_session_context_persists_within_the_same_session() {
    let mock = Arc::new(MockBackend::new(json!({})));
    let gw = gateway(mock);

    let set_params = json!({ "name": "session.set", "arguments": { "key": "account_scope", "value": { "id": 42 } } });
    gw.dispatcher
        .handle("tools/call", &set_params, Some("sess-1".to_string()), None, Duration::from_secs(5))
        .await
        .unwrap();

    let get_params = json!({ "name": "session.get", "arguments": { "key": "account_scope" } });
    let result = gw
        .dispatcher
        .handle("tools/call", &get_params, Some("sess-1".to_string()), None, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(result["value"]["id"], 42);

    let missing_params = json!({ "name": "session.get", "arguments": { "key": "never_set" } });
    let err = gw
        .dispatcher
        .handle("tools/call", &missing_params, Some("sess-1".to_string()), None, Duration::from_secs(5))
        .await
        .unwrap_err();
    assert_eq!(err.data.unwrap().error_type, Some("data_not_found"));
}

/// `discovery.job_status` on a job id that was never started is
/// `data_not_found`, not a panic or an internal error.
#[tokio::test]
async fn unknown_job_id_is_data_not_found() {
    let mock = Arc::new(MockBackend::new(json!({})));
    let gw = gateway(mock);

    let params = json!({ "name": "discovery.job_status", "arguments": { "job_id": "does-not-exist" } });
    let err = gw.dispatcher.handle("tools/call", &params, None, None, Duration::from_secs(5)).await.unwrap_err();
    assert_eq!(err.data.unwrap().error_type, Some("data_not_found"));
}

/// `alerts.manage` issues one mutation per policy independently: a failure
/// on one policy doesn't stop the others from being attempted.
#[tokio::test]
async fn alerts_manage_applies_each_policy_independently() {
    use ogw_backend::mock::Scripted;

    let mock = Arc::new(MockBackend::new(json!({ "alertsPolicyCreate": { "id": "p-1" } })));
    mock.push(Scripted::GraphQlErrors(vec!["policy name already exists".into()]));
    let gw = gateway(mock.clone());

    let params = json!({
        "name": "alerts.manage",
        "arguments": {
            "confirm": true,
            "policies": [
                { "action": "create", "name": "dup-policy" },
                { "action": "create", "name": "new-policy" },
            ],
        },
    });
    let result = gw.dispatcher.handle("tools/call", &params, None, None, Duration::from_secs(5)).await.unwrap();
    let statuses: Vec<&str> = result["results"].as_array().unwrap().iter().map(|r| r["status"].as_str().unwrap()).collect();

    assert_eq!(mock.call_count(), 2);
    assert!(statuses.contains(&"ok"));
    assert!(statuses.contains(&"error"));
}
