use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Token-bucket rate limiting (part of C2), global plus per-tool-class
/// overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Global requests/sec (spec.md default: 100/s).
    #[serde(default = "d_global_rps")]
    pub global_requests_per_second: f64,
    #[serde(default = "d_burst")]
    pub global_burst: f64,
    /// Per-tool-class overrides, keyed by class name (e.g. "bulk", "query").
    #[serde(default)]
    pub per_class: HashMap<String, ToolClassRateLimit>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_requests_per_second: d_global_rps(),
            global_burst: d_burst(),
            per_class: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolClassRateLimit {
    pub requests_per_second: f64,
    pub burst: f64,
}

fn d_global_rps() -> f64 {
    100.0
}
fn d_burst() -> f64 {
    100.0
}
