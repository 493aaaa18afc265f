//! Discovery data model (spec.md §3: "Discovered Schema", "Attribute
//! Profile", "Quality Report", "Relationship Edge").

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredSchema {
    pub name: String,
    pub observed_sample_count: u64,
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    Numeric,
    Boolean,
    Timestamp,
    String,
    Array,
    Object,
    Unknown,
}

impl AttributeType {
    /// Tie-break precedence for majority-vote type inference (spec.md
    /// §4.6: "numeric > boolean > timestamp > string > array > object >
    /// unknown"). Lower rank wins a tie.
    fn rank(self) -> u8 {
        match self {
            AttributeType::Numeric => 0,
            AttributeType::Boolean => 1,
            AttributeType::Timestamp => 2,
            AttributeType::String => 3,
            AttributeType::Array => 4,
            AttributeType::Object => 5,
            AttributeType::Unknown => 6,
        }
    }

    pub fn better_tiebreak(self, other: AttributeType) -> bool {
        self.rank() < other.rank()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeProfile {
    pub name: String,
    pub inferred_type: AttributeType,
    pub cardinality_estimate: u64,
    /// Fraction of samples where the attribute is absent or explicitly
    /// null. Independently bounded to `[0,1]` from `coverage_ratio` (spec.md
    /// §3: "both must fit in [0,1] individually").
    pub null_ratio: f64,
    /// Fraction of samples where the attribute is present (whether or not
    /// its value is null).
    pub coverage_ratio: f64,
    /// Denominator used for `null_ratio`/`coverage_ratio` (the schema's
    /// total sample count, not just this attribute's present-count) — kept
    /// alongside `cardinality_estimate` so quality scoring's "high
    /// cardinality" threshold (spec.md §4.6: `estimated_cardinality > 0.9 ×
    /// sample_count`) can be computed without re-deriving it from a ratio.
    pub sample_count: u64,
    pub sample_values: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub schema: String,
    pub score: f64,
    pub coverage_component: f64,
    pub null_component: f64,
    pub freshness_component: f64,
    pub cardinality_component: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinEvidence {
    pub matched_rows: u64,
    pub total_rows: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub source_schema: String,
    pub target_schema: String,
    pub linking_attribute: String,
    pub confidence: f64,
    pub evidence: JoinEvidence,
}

/// Wraps a discovery result with spec.md §4.6's partial-failure contract:
/// "if a sub-query fails, its contribution is marked unknown and the
/// overall result includes `partial = true` with a list of failed
/// sub-queries."
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialResult<T> {
    pub items: Vec<T>,
    pub partial: bool,
    pub failed_sub_queries: Vec<String>,
}

impl<T> PartialResult<T> {
    pub fn complete(items: Vec<T>) -> Self {
        Self { items, partial: false, failed_sub_queries: Vec::new() }
    }
}
