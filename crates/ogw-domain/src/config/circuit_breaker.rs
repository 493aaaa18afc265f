use serde::{Deserialize, Serialize};

/// Circuit breaker policy (part of C2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    #[serde(default = "d_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "d_cooldown_secs")]
    pub cooldown_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: d_failure_threshold(),
            cooldown_secs: d_cooldown_secs(),
        }
    }
}

fn d_failure_threshold() -> u32 {
    5
}
fn d_cooldown_secs() -> u64 {
    30
}
