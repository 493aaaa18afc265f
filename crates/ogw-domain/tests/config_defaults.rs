use ogw_domain::config::{CacheBackendKind, Config, TransportMode};

#[test]
fn defaults_match_spec_table() {
    let config = Config::default();

    assert_eq!(config.cache.max_entries, 1000);
    assert_eq!(config.cache.max_bytes, 100 * 1024 * 1024);
    assert_eq!(config.cache.backend, CacheBackendKind::InProcess);

    assert_eq!(config.rate_limit.global_requests_per_second, 100.0);

    assert_eq!(config.retry.max_retries, 3);
    assert_eq!(config.retry.base_delay_ms, 1000);
    assert_eq!(config.retry.multiplier, 2.0);

    assert_eq!(config.circuit_breaker.failure_threshold, 5);
    assert_eq!(config.circuit_breaker.cooldown_secs, 30);

    assert_eq!(config.sessions.max_idle_secs, 600);
    assert_eq!(config.sessions.cleanup_interval_secs, 300);
    assert_eq!(config.sessions.max_context_bytes, 1024 * 1024);

    assert_eq!(config.discovery.max_discovery_workers, 10);
    assert_eq!(config.discovery.sample_size, 1000);

    assert_eq!(config.query_policy.max_time_window_days, 30);
    assert!(!config.query_policy.mutations_allowed);

    assert_eq!(config.server.transport, TransportMode::Stdio);
}

#[test]
fn load_or_default_survives_missing_file() {
    let config = Config::load_or_default(std::path::Path::new("/nonexistent/ogw.toml"))
        .expect("falls back to defaults");
    assert_eq!(config.cache.max_entries, 1000);
}
