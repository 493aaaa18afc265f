//! Attribute profiling (spec.md §4.6 "Attribute profiling"): given up to
//! `sample_size` sampled events for a schema (each a flat JSON object),
//! computes per-attribute type, cardinality, null ratio, coverage ratio,
//! and up to 20 example values.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::model::{AttributeProfile, AttributeType};

const MAX_EXAMPLE_VALUES: usize = 20;
/// Above this many distinct observed values, switch from exact counting to
/// an approximate estimate (spec.md §4.6: "HyperLogLog-style estimator or
/// exact if below 10 000").
const EXACT_CARDINALITY_CEILING: usize = 10_000;

fn classify(value: &Value) -> Option<AttributeType> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(AttributeType::Boolean),
        Value::Number(_) => Some(AttributeType::Numeric),
        Value::String(s) => {
            if chrono::DateTime::parse_from_rfc3339(s).is_ok() {
                Some(AttributeType::Timestamp)
            } else {
                Some(AttributeType::String)
            }
        }
        Value::Array(_) => Some(AttributeType::Array),
        Value::Object(_) => Some(AttributeType::Object),
    }
}

/// Computes an [`AttributeProfile`] for `attribute_name` across `samples`
/// (each a flat JSON object representing one sampled event). `total_samples`
/// is the sample count used as the denominator for coverage/null ratios —
/// it may exceed `samples.len()` when some samples failed to decode, but in
/// the normal path is `samples.len()`.
pub fn profile_attribute(attribute_name: &str, samples: &[Value], total_samples: usize) -> AttributeProfile {
    let mut present = 0usize;
    let mut null_count = 0usize;
    let mut type_votes: HashMap<AttributeType, usize> = HashMap::new();
    let mut distinct: HashSet<String> = HashSet::new();
    let mut examples: Vec<Value> = Vec::new();

    for sample in samples {
        let Some(obj) = sample.as_object() else { continue };
        let Some(value) = obj.get(attribute_name) else { continue };
        present += 1;

        match classify(value) {
            None => null_count += 1,
            Some(kind) => {
                *type_votes.entry(kind).or_insert(0) += 1;
                let key = canonical_value_key(value);
                if distinct.insert(key) && examples.len() < MAX_EXAMPLE_VALUES {
                    examples.push(value.clone());
                }
            }
        }
    }

    let inferred_type = majority_type(&type_votes);
    let cardinality_estimate = estimate_cardinality(distinct.len());

    let total = total_samples.max(1) as f64;
    AttributeProfile {
        name: attribute_name.to_string(),
        inferred_type,
        cardinality_estimate,
        null_ratio: (null_count as f64 / total).clamp(0.0, 1.0),
        coverage_ratio: (present as f64 / total).clamp(0.0, 1.0),
        sample_count: total_samples as u64,
        sample_values: examples,
    }
}

/// Majority vote over observed non-null types, tie-broken by
/// [`AttributeType::better_tiebreak`]'s precedence order. An attribute with
/// no non-null observations is `Unknown`.
fn majority_type(votes: &HashMap<AttributeType, usize>) -> AttributeType {
    let mut best: Option<(AttributeType, usize)> = None;
    for (&kind, &count) in votes {
        best = match best {
            None => Some((kind, count)),
            Some((best_kind, best_count)) => {
                if count > best_count || (count == best_count && kind.better_tiebreak(best_kind)) {
                    Some((kind, count))
                } else {
                    Some((best_kind, best_count))
                }
            }
        };
    }
    best.map(|(kind, _)| kind).unwrap_or(AttributeType::Unknown)
}

/// Exact below the ceiling; above it, a log-linear approximation in the
/// spirit of a HyperLogLog register estimate (we only ever see a bounded
/// sample, so a full probabilistic sketch over the Backend's unbounded
/// event stream is out of scope here — this approximates the same
/// "cardinality grows sub-linearly past a point" shape).
fn estimate_cardinality(distinct_count: usize) -> u64 {
    if distinct_count < EXACT_CARDINALITY_CEILING {
        distinct_count as u64
    } else {
        let exact = distinct_count as f64;
        (exact * (1.0 + (exact / EXACT_CARDINALITY_CEILING as f64).ln())) as u64
    }
}

/// Stable string key for distinct-value tracking of non-scalar JSON values.
fn canonical_value_key(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
