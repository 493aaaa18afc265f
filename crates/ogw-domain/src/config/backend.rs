use serde::{Deserialize, Serialize};

/// Backend Transport (C1) configuration: the GraphQL observability endpoint
/// the gateway brokers requests into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "d_endpoint")]
    pub endpoint_url: String,
    /// Account scope — part of the cache-key derivation (spec.md §4.3).
    #[serde(default)]
    pub account_id: String,
    /// Name of the env var holding the API credential. The credential value
    /// itself is never stored in config and never logged.
    #[serde(default = "d_credential_env")]
    pub credential_env: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default = "d_pool_size")]
    pub connection_pool_size: usize,
    #[serde(default = "d_call_timeout_ms")]
    pub default_call_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint_url: d_endpoint(),
            account_id: String::new(),
            credential_env: d_credential_env(),
            region: None,
            connection_pool_size: d_pool_size(),
            default_call_timeout_ms: d_call_timeout_ms(),
        }
    }
}

fn d_endpoint() -> String {
    "https://api.backend.invalid/graphql".into()
}
fn d_credential_env() -> String {
    "OGW_BACKEND_API_KEY".into()
}
fn d_pool_size() -> usize {
    10
}
fn d_call_timeout_ms() -> u64 {
    30_000
}
