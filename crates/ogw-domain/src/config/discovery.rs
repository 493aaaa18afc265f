use serde::{Deserialize, Serialize};

/// Discovery Engine (C6) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "d_max_workers")]
    pub max_discovery_workers: usize,
    #[serde(default = "d_sample_size")]
    pub sample_size: usize,
    #[serde(default = "d_min_confidence")]
    pub min_relationship_confidence: f64,
    #[serde(default = "d_min_observation_count")]
    pub min_schema_observation_count: u64,
    #[serde(default = "d_schema_ttl_secs")]
    pub schema_ttl_secs: u64,
    #[serde(default = "d_attribute_ttl_secs")]
    pub attribute_ttl_secs: u64,
    #[serde(default = "d_relationship_ttl_secs")]
    pub relationship_ttl_secs: u64,
    #[serde(default = "d_quality_ttl_secs")]
    pub quality_ttl_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_discovery_workers: d_max_workers(),
            sample_size: d_sample_size(),
            min_relationship_confidence: d_min_confidence(),
            min_schema_observation_count: d_min_observation_count(),
            schema_ttl_secs: d_schema_ttl_secs(),
            attribute_ttl_secs: d_attribute_ttl_secs(),
            relationship_ttl_secs: d_relationship_ttl_secs(),
            quality_ttl_secs: d_quality_ttl_secs(),
        }
    }
}

fn d_max_workers() -> usize {
    10
}
fn d_sample_size() -> usize {
    1000
}
fn d_min_confidence() -> f64 {
    0.7
}
fn d_min_observation_count() -> u64 {
    1
}
fn d_schema_ttl_secs() -> u64 {
    5 * 60
}
fn d_attribute_ttl_secs() -> u64 {
    2 * 60
}
fn d_relationship_ttl_secs() -> u64 {
    30 * 60
}
fn d_quality_ttl_secs() -> u64 {
    10 * 60
}
