use serde::{Deserialize, Serialize};

/// Cache (C3) configuration — L1 bounded in-process cache plus an optional
/// L2 distributed backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "d_backend")]
    pub backend: CacheBackendKind,
    #[serde(default = "d_max_entries")]
    pub max_entries: usize,
    #[serde(default = "d_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "d_default_ttl_secs")]
    pub default_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: d_backend(),
            max_entries: d_max_entries(),
            max_bytes: d_max_bytes(),
            default_ttl_secs: d_default_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackendKind {
    /// L1 only.
    InProcess,
    /// L1 fronting an L2 distributed KV store.
    Distributed,
}

fn d_backend() -> CacheBackendKind {
    CacheBackendKind::InProcess
}
fn d_max_entries() -> usize {
    1000
}
fn d_max_bytes() -> u64 {
    100 * 1024 * 1024
}
fn d_default_ttl_secs() -> u64 {
    300
}
