use std::time::Duration;

use ogw_resilience::{CircuitBreaker, CircuitState, RateLimiterRegistry};
use ogw_domain::config::{RateLimitConfig, ToolClassRateLimit};

#[tokio::test]
async fn circuit_opens_on_five_consecutive_failures_scenario_d() {
    let cb = CircuitBreaker::new(5, Duration::from_millis(50));

    for i in 0..5 {
        assert!(cb.check().is_ok(), "call {i} should reach the transport");
        cb.record_failure();
    }
    assert_eq!(cb.state(), CircuitState::Open);
    assert!(cb.check().is_err(), "6th call must short-circuit");

    tokio::time::sleep(Duration::from_millis(60)).await;
    // Healthy probe succeeds, circuit returns to closed and stays there.
    assert!(cb.check().is_ok());
    cb.record_success();
    assert_eq!(cb.state(), CircuitState::Closed);
    assert!(cb.check().is_ok());
}

#[tokio::test]
async fn rate_limiter_one_winner_one_loser_with_zero_refill() {
    let mut config = RateLimitConfig {
        global_requests_per_second: 1000.0,
        global_burst: 1000.0,
        per_class: std::collections::HashMap::new(),
    };
    config
        .per_class
        .insert("query".into(), ToolClassRateLimit { requests_per_second: 0.0, burst: 1.0 });
    let registry = RateLimiterRegistry::new(config);

    let a = registry.acquire("query", Duration::from_millis(5)).await;
    let b = registry.acquire("query", Duration::from_millis(5)).await;
    assert!(a.is_ok() ^ b.is_ok(), "exactly one of two concurrent callers should win");
}
