mod backend;
mod cache;
mod circuit_breaker;
mod discovery;
mod query_policy;
mod rate_limit;
mod retry;
mod server;
mod sessions;

pub use backend::BackendConfig;
pub use cache::{CacheBackendKind, CacheConfig};
pub use circuit_breaker::CircuitBreakerConfig;
pub use discovery::DiscoveryConfig;
pub use query_policy::QueryPolicyConfig;
pub use rate_limit::{RateLimitConfig, ToolClassRateLimit};
pub use retry::RetryConfig;
pub use server::{ServerConfig, TransportMode};
pub use sessions::SessionsConfig;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    #[serde(default)]
    pub query_policy: QueryPolicyConfig,
}

impl Config {
    /// Load from a TOML file, then layer `OGW_*` environment overrides on
    /// top (mirrors the teacher's `SA_*` env convention).
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut config: Config =
            toml::from_str(&raw).map_err(|e| Error::Config(format!("parsing {}: {e}", path.display())))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Same as [`Config::load`] but falls back to defaults when `path` does
    /// not exist, still applying env overrides.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let mut config = Config::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("OGW_BACKEND_ENDPOINT_URL") {
            self.backend.endpoint_url = v;
        }
        if let Ok(v) = std::env::var("OGW_BACKEND_ACCOUNT_ID") {
            self.backend.account_id = v;
        }
        if let Ok(v) = std::env::var("OGW_SERVER_PORT") {
            if let Ok(port) = v.parse() {
                self.server.port = port;
            }
        }
        if let Ok(v) = std::env::var("OGW_CACHE_MAX_BYTES") {
            if let Ok(bytes) = v.parse() {
                self.cache.max_bytes = bytes;
            }
        }
    }

    /// Validate cross-field/range invariants. Errors should block startup
    /// (`doctor`/`config validate` surface these); warnings are advisory.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.backend.endpoint_url.trim().is_empty() {
            issues.push(ConfigIssue {
                field: "backend.endpoint_url".into(),
                message: "Backend endpoint URL must not be empty".into(),
                severity: ConfigSeverity::Error,
            });
        }
        if self.backend.connection_pool_size == 0 {
            issues.push(ConfigIssue {
                field: "backend.connection_pool_size".into(),
                message: "connection pool size must be >= 1".into(),
                severity: ConfigSeverity::Error,
            });
        }
        if self.cache.max_entries == 0 {
            issues.push(ConfigIssue {
                field: "cache.max_entries".into(),
                message: "cache.max_entries must be >= 1".into(),
                severity: ConfigSeverity::Error,
            });
        }
        if self.cache.max_bytes == 0 {
            issues.push(ConfigIssue {
                field: "cache.max_bytes".into(),
                message: "cache.max_bytes must be >= 1".into(),
                severity: ConfigSeverity::Error,
            });
        }
        if self.rate_limit.global_requests_per_second <= 0.0 {
            issues.push(ConfigIssue {
                field: "rate_limit.global_requests_per_second".into(),
                message: "global rate must be > 0".into(),
                severity: ConfigSeverity::Error,
            });
        }
        if self.retry.multiplier < 1.0 {
            issues.push(ConfigIssue {
                field: "retry.multiplier".into(),
                message: "backoff multiplier < 1.0 will not back off; expected >= 1.0".into(),
                severity: ConfigSeverity::Warning,
            });
        }
        if self.circuit_breaker.failure_threshold == 0 {
            issues.push(ConfigIssue {
                field: "circuit_breaker.failure_threshold".into(),
                message: "failure_threshold must be >= 1".into(),
                severity: ConfigSeverity::Error,
            });
        }
        if self.query_policy.max_time_window_days <= 0 {
            issues.push(ConfigIssue {
                field: "query_policy.max_time_window_days".into(),
                message: "max_time_window_days must be > 0".into(),
                severity: ConfigSeverity::Error,
            });
        }
        if self.sessions.max_session_count == 0 {
            issues.push(ConfigIssue {
                field: "sessions.max_session_count".into(),
                message: "sessions.max_session_count must be >= 1".into(),
                severity: ConfigSeverity::Error,
            });
        }
        if self.discovery.max_discovery_workers == 0 {
            issues.push(ConfigIssue {
                field: "discovery.max_discovery_workers".into(),
                message: "discovery.max_discovery_workers must be >= 1".into(),
                severity: ConfigSeverity::Error,
            });
        }

        issues
    }

    pub fn has_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(|i| i.severity == ConfigSeverity::Error)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Validation issues
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

impl std::fmt::Display for ConfigSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSeverity::Error => write!(f, "ERROR"),
            ConfigSeverity::Warning => write!(f, "WARN"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub field: String,
    pub message: String,
    pub severity: ConfigSeverity,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_errors() {
        let config = Config::default();
        let issues = config.validate();
        assert!(!Config::has_errors(&issues), "issues: {issues:?}");
    }

    #[test]
    fn empty_endpoint_is_an_error() {
        let mut config = Config::default();
        config.backend.endpoint_url = String::new();
        let issues = config.validate();
        assert!(Config::has_errors(&issues));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string(&config).expect("serialize");
        let parsed: Config = toml::from_str(&text).expect("parse");
        assert_eq!(parsed.cache.max_entries, config.cache.max_entries);
    }
}
