use serde::{Deserialize, Serialize};

/// Session Store (C4) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    #[serde(default = "d_max_idle_secs")]
    pub max_idle_secs: u64,
    #[serde(default = "d_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    #[serde(default = "d_max_context_bytes")]
    pub max_context_bytes: usize,
    #[serde(default = "d_max_session_count")]
    pub max_session_count: usize,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_idle_secs: d_max_idle_secs(),
            cleanup_interval_secs: d_cleanup_interval_secs(),
            max_context_bytes: d_max_context_bytes(),
            max_session_count: d_max_session_count(),
        }
    }
}

fn d_max_idle_secs() -> u64 {
    10 * 60
}
fn d_cleanup_interval_secs() -> u64 {
    5 * 60
}
fn d_max_context_bytes() -> usize {
    1024 * 1024
}
fn d_max_session_count() -> usize {
    10_000
}
