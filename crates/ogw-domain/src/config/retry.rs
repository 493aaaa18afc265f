use serde::{Deserialize, Serialize};

/// Retry-with-backoff policy (part of C2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "d_max_retries")]
    pub max_retries: u32,
    #[serde(default = "d_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "d_multiplier")]
    pub multiplier: f64,
    #[serde(default = "d_jitter_ratio")]
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: d_max_retries(),
            base_delay_ms: d_base_delay_ms(),
            multiplier: d_multiplier(),
            jitter_ratio: d_jitter_ratio(),
        }
    }
}

fn d_max_retries() -> u32 {
    3
}
fn d_base_delay_ms() -> u64 {
    1000
}
fn d_multiplier() -> f64 {
    2.0
}
fn d_jitter_ratio() -> f64 {
    0.2
}
