//! Relationship mining (spec.md §4.6 "Relationship mining"): for each pair
//! of schemas sharing a candidate attribute name, issues a join-coverage
//! query and emits an edge when confidence clears the configured minimum.

use serde::Deserialize;

use crate::model::{AttributeProfile, JoinEvidence, RelationshipEdge};

/// Attribute names shared between two schemas' profiled attributes —
/// candidates for a join key (spec.md §4.6: "sharing at least one
/// candidate attribute name").
pub fn candidate_attributes(left: &[AttributeProfile], right: &[AttributeProfile]) -> Vec<String> {
    let right_names: std::collections::HashSet<&str> = right.iter().map(|a| a.name.as_str()).collect();
    left.iter()
        .map(|a| a.name.as_str())
        .filter(|name| right_names.contains(name))
        .map(str::to_string)
        .collect()
}

pub fn join_coverage_query() -> &'static str {
    "query JoinCoverage($source: String!, $target: String!, $attribute: String!, $window: TimeWindow!) { \
     joinCoverage(source: $source, target: $target, attribute: $attribute, window: $window) { matchedRows totalRows } }"
}

#[derive(Debug, Deserialize)]
struct RawJoinCoverage {
    #[serde(rename = "matchedRows")]
    matched_rows: u64,
    #[serde(rename = "totalRows")]
    total_rows: u64,
}

#[derive(Debug, Deserialize)]
struct RawJoinCoverageEnvelope {
    #[serde(rename = "joinCoverage")]
    join_coverage: RawJoinCoverage,
}

/// Parses a join-coverage response into a `RelationshipEdge` if confidence
/// clears `min_confidence` (spec.md §4.6: "Edges with confidence >= 0.7 are
/// emitted"), otherwise `None`.
pub fn parse_join_coverage(
    data: &serde_json::Value,
    source_schema: &str,
    target_schema: &str,
    attribute: &str,
    min_confidence: f64,
) -> Result<Option<RelationshipEdge>, String> {
    let raw: RawJoinCoverageEnvelope = serde_json::from_value(data.clone()).map_err(|e| e.to_string())?;
    let coverage = raw.join_coverage;

    if coverage.total_rows == 0 {
        return Ok(None);
    }
    let confidence = coverage.matched_rows as f64 / coverage.total_rows as f64;
    if confidence < min_confidence {
        return Ok(None);
    }

    Ok(Some(RelationshipEdge {
        source_schema: source_schema.to_string(),
        target_schema: target_schema.to_string(),
        linking_attribute: attribute.to_string(),
        confidence,
        evidence: JoinEvidence { matched_rows: coverage.matched_rows, total_rows: coverage.total_rows },
    }))
}
