//! Wires the configured `Config` into a live [`Dispatcher`]: transport,
//! resilience wrapper, cache, sessions, discovery engine, and the default
//! tool catalogue, mirroring the teacher's `main.rs` component-by-component
//! assembly (each step logs once it's ready).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use ogw_backend::{BackendTransport, HttpBackendTransport, ResilientBackend};
use ogw_cache::Cache;
use ogw_discovery::DiscoveryEngine;
use ogw_domain::config::Config;
use ogw_resilience::RateLimiterRegistry;
use ogw_sessions::SessionStore;
use ogw_tools::{default_catalog, CatalogDeps, Dispatcher, Registry};

/// Everything a transport loop needs to serve requests.
pub struct Gateway {
    pub dispatcher: Arc<Dispatcher>,
    pub sessions: Arc<SessionStore>,
}

pub fn build(config: &Config) -> anyhow::Result<Gateway> {
    let credential = std::env::var(&config.backend.credential_env).unwrap_or_default();
    if credential.is_empty() {
        tracing::warn!(
            env_var = %config.backend.credential_env,
            "Backend credential env var is unset — Backend calls will be sent unauthenticated"
        );
    }

    let transport = Arc::new(HttpBackendTransport::new(
        config.backend.endpoint_url.clone(),
        credential,
        config.backend.connection_pool_size,
    ));
    tracing::info!(endpoint = %config.backend.endpoint_url, "Backend transport ready");

    build_with_transport(config, transport)
}

/// Same assembly as [`build`], but takes the transport directly rather than
/// constructing an [`HttpBackendTransport`] — the seam integration tests use
/// to substitute `MockBackend` for a live endpoint.
pub fn build_with_transport(config: &Config, transport: Arc<dyn BackendTransport>) -> anyhow::Result<Gateway> {
    let backend = Arc::new(ResilientBackend::new(
        transport,
        config.circuit_breaker.clone(),
        config.rate_limit.clone(),
        config.retry.clone(),
    ));
    tracing::info!("resilience wrapper ready");

    let cache = Arc::new(Cache::new(&config.cache, None));
    tracing::info!(max_entries = config.cache.max_entries, max_bytes = config.cache.max_bytes, "cache ready");

    let sessions = Arc::new(SessionStore::new(&config.sessions));
    ogw_sessions::spawn_reaper(sessions.clone(), Duration::from_secs(config.sessions.cleanup_interval_secs));
    tracing::info!(max_session_count = config.sessions.max_session_count, "session store ready, reaper spawned");

    let discovery = Arc::new(DiscoveryEngine::new(
        backend.clone(),
        cache.clone(),
        config.discovery.clone(),
        config.backend.account_id.clone(),
    ));
    tracing::info!("discovery engine ready");

    let catalog = default_catalog(CatalogDeps {
        discovery,
        backend: backend.clone(),
        query_policy: config.query_policy.clone(),
        account_id: config.backend.account_id.clone(),
    });
    let tool_count = catalog.len();
    let registry = Registry::build(catalog).map_err(|e| anyhow::anyhow!(e)).context("building tool registry")?;
    tracing::info!(tool_count, "tool registry ready");

    let rate_limiter = Arc::new(RateLimiterRegistry::new(config.rate_limit.clone()));
    let dispatcher = Arc::new(Dispatcher::new(
        registry,
        cache,
        rate_limiter,
        sessions.clone(),
        config.backend.account_id.clone(),
    ));
    tracing::info!("dispatcher ready");

    Ok(Gateway { dispatcher, sessions })
}
