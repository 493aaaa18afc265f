use serde::{Deserialize, Serialize};

/// Query Validator/Builder (C5) policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPolicyConfig {
    #[serde(default = "d_validation_enabled")]
    pub validation_enabled: bool,
    #[serde(default = "d_mutations_allowed")]
    pub mutations_allowed: bool,
    #[serde(default = "d_max_window_days")]
    pub max_time_window_days: i64,
    #[serde(default = "d_max_complexity")]
    pub max_complexity: u32,
    #[serde(default = "d_max_depth")]
    pub max_depth: u32,
}

impl Default for QueryPolicyConfig {
    fn default() -> Self {
        Self {
            validation_enabled: d_validation_enabled(),
            mutations_allowed: d_mutations_allowed(),
            max_time_window_days: d_max_window_days(),
            max_complexity: d_max_complexity(),
            max_depth: d_max_depth(),
        }
    }
}

fn d_validation_enabled() -> bool {
    true
}
fn d_mutations_allowed() -> bool {
    false
}
fn d_max_window_days() -> i64 {
    30
}
fn d_max_complexity() -> u32 {
    250
}
fn d_max_depth() -> u32 {
    10
}
