use std::sync::Arc;
use std::time::Duration;

use ogw_backend::{mock::Scripted, GraphQlRequest, MockBackend, ResilientBackend};
use ogw_domain::config::{CircuitBreakerConfig, RateLimitConfig, RetryConfig};
use serde_json::Value;

#[tokio::test]
async fn deadline_is_respected_across_retries() {
    let mock = Arc::new(MockBackend::new(serde_json::json!({"ok": true})));
    mock.push_n(Scripted::Timeout, 10);

    let backend = ResilientBackend::new(
        mock,
        CircuitBreakerConfig { failure_threshold: 100, cooldown_secs: 30 },
        RateLimitConfig { global_requests_per_second: 1000.0, global_burst: 1000.0, per_class: Default::default() },
        RetryConfig { max_retries: 10, base_delay_ms: 50, multiplier: 2.0, jitter_ratio: 0.0 },
    );

    let req = GraphQlRequest::new("{ ping }", Value::Null, "acct");
    let started = std::time::Instant::now();
    let result = backend.call("default", req, Duration::from_millis(120)).await;
    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(2), "must not retry past the deadline");
}
