//! Quality scoring (spec.md §4.6 "Quality scoring"): a weighted combination
//! of coverage, null ratio, freshness, and cardinality-plausibility,
//! computed from an already-profiled schema's attributes.

use chrono::{DateTime, Utc};

use crate::model::{AttributeProfile, QualityReport};

const COVERAGE_WEIGHT: f64 = 0.35;
const NULL_WEIGHT: f64 = 0.25;
const FRESHNESS_WEIGHT: f64 = 0.20;
const CARDINALITY_WEIGHT: f64 = 0.20;

/// Computes a [`QualityReport`] for `schema` from its profiled attributes
/// and the most recent observation timestamp seen for it (spec.md §4.6:
/// "freshness = recency of the most recent observation relative to now").
///
/// `most_recent_observation` is `None` when no attribute yielded a parsable
/// timestamp, in which case the freshness component is scored `0.0` rather
/// than excluded — an unknown freshness is treated as stale, not as neutral
/// (spec.md §4.6 edge case: "freshness cannot be determined").
pub fn score_quality(schema: &str, attributes: &[AttributeProfile], most_recent_observation: Option<DateTime<Utc>>, now: DateTime<Utc>) -> QualityReport {
    let coverage_component = mean_ratio(attributes, |a| a.coverage_ratio);
    let null_component = 1.0 - mean_ratio(attributes, |a| a.null_ratio);
    let freshness_component = freshness_score(most_recent_observation, now);
    let cardinality_component = mean_cardinality_plausibility(attributes);

    let score = COVERAGE_WEIGHT * coverage_component
        + NULL_WEIGHT * null_component
        + FRESHNESS_WEIGHT * freshness_component
        + CARDINALITY_WEIGHT * cardinality_component;

    QualityReport {
        schema: schema.to_string(),
        score: score.clamp(0.0, 1.0),
        coverage_component,
        null_component,
        freshness_component,
        cardinality_component,
    }
}

fn mean_ratio(attributes: &[AttributeProfile], f: impl Fn(&AttributeProfile) -> f64) -> f64 {
    if attributes.is_empty() {
        return 0.0;
    }
    let sum: f64 = attributes.iter().map(f).sum();
    (sum / attributes.len() as f64).clamp(0.0, 1.0)
}

/// A plateau for the first 5 minutes, then linear decay to 0 at 24h
/// (spec.md §4.6: "`freshness = 1` if the most recent sample is within 5
/// min, linearly decaying to 0 at 24 h").
fn freshness_score(most_recent: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(most_recent) = most_recent else { return 0.0 };
    let age_secs = (now - most_recent).num_seconds().max(0) as f64;
    const PLATEAU_SECS: f64 = 5.0 * 60.0;
    const DAY_SECS: f64 = 24.0 * 60.0 * 60.0;
    if age_secs <= PLATEAU_SECS {
        1.0
    } else {
        (1.0 - (age_secs - PLATEAU_SECS) / (DAY_SECS - PLATEAU_SECS)).clamp(0.0, 1.0)
    }
}

/// `cardinality_health = 1 − min(1, high_cardinality_attrs / total_attrs)`
/// where an attribute is "high cardinality" if
/// `estimated_cardinality > 0.9 × sample_count` (spec.md §4.6).
fn mean_cardinality_plausibility(attributes: &[AttributeProfile]) -> f64 {
    if attributes.is_empty() {
        return 0.0;
    }
    let high_cardinality_attrs = attributes
        .iter()
        .filter(|a| (a.cardinality_estimate as f64) > 0.9 * a.sample_count as f64)
        .count();
    (1.0 - (high_cardinality_attrs as f64 / attributes.len() as f64).min(1.0)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeType;
    use chrono::Duration as ChronoDuration;

    fn profile(coverage: f64, null_ratio: f64, cardinality: u64) -> AttributeProfile {
        profile_with_samples(coverage, null_ratio, cardinality, 1000)
    }

    fn profile_with_samples(coverage: f64, null_ratio: f64, cardinality: u64, sample_count: u64) -> AttributeProfile {
        AttributeProfile {
            name: "a".into(),
            inferred_type: AttributeType::String,
            cardinality_estimate: cardinality,
            null_ratio,
            coverage_ratio: coverage,
            sample_count,
            sample_values: Vec::new(),
        }
    }

    #[test]
    fn perfect_attributes_with_fresh_observation_score_near_one() {
        let now = DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let attrs = vec![profile(1.0, 0.0, 500), profile(1.0, 0.0, 500)];
        let report = score_quality("Transaction", &attrs, Some(now), now);
        assert!(report.score > 0.99, "expected near-perfect score, got {}", report.score);
    }

    #[test]
    fn stale_observation_drags_down_freshness_only() {
        let now = DateTime::parse_from_rfc3339("2024-06-02T00:00:00Z").unwrap().with_timezone(&Utc);
        let two_days_ago = now - ChronoDuration::days(2);
        let attrs = vec![profile(1.0, 0.0, 500)];
        let report = score_quality("Transaction", &attrs, Some(two_days_ago), now);
        assert_eq!(report.freshness_component, 0.0);
        assert_eq!(report.coverage_component, 1.0);
    }

    #[test]
    fn unknown_freshness_scores_as_stale_not_neutral() {
        let now = DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let attrs = vec![profile(1.0, 0.0, 500)];
        let report = score_quality("Transaction", &attrs, None, now);
        assert_eq!(report.freshness_component, 0.0);
    }

    #[test]
    fn empty_attribute_list_scores_zero_without_panicking() {
        let now = DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let report = score_quality("Empty", &[], None, now);
        assert_eq!(report.score, 0.0);
    }

    #[test]
    fn score_is_always_clamped_to_unit_interval() {
        let now = DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let attrs = vec![profile(1.0, 0.0, 500)];
        let report = score_quality("Transaction", &attrs, Some(now), now);
        assert!((0.0..=1.0).contains(&report.score));
    }

    #[test]
    fn observation_within_five_minutes_scores_full_freshness() {
        let now = DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let three_minutes_ago = now - ChronoDuration::minutes(3);
        let attrs = vec![profile(1.0, 0.0, 500)];
        let report = score_quality("Transaction", &attrs, Some(three_minutes_ago), now);
        assert_eq!(report.freshness_component, 1.0);
    }

    #[test]
    fn observation_just_past_five_minutes_starts_decaying() {
        let now = DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let six_minutes_ago = now - ChronoDuration::minutes(6);
        let attrs = vec![profile(1.0, 0.0, 500)];
        let report = score_quality("Transaction", &attrs, Some(six_minutes_ago), now);
        assert!(report.freshness_component < 1.0);
        assert!(report.freshness_component > 0.99);
    }

    #[test]
    fn attribute_with_cardinality_above_ninety_percent_of_samples_is_high_cardinality() {
        let now = DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let attrs = vec![profile_with_samples(1.0, 0.0, 950, 1000)];
        let report = score_quality("Transaction", &attrs, Some(now), now);
        assert_eq!(report.cardinality_component, 0.0);
    }

    #[test]
    fn attribute_with_cardinality_at_or_below_ninety_percent_of_samples_is_not_high_cardinality() {
        let now = DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let attrs = vec![profile_with_samples(1.0, 0.0, 900, 1000)];
        let report = score_quality("Transaction", &attrs, Some(now), now);
        assert_eq!(report.cardinality_component, 1.0);
    }

    #[test]
    fn cardinality_health_is_the_fraction_of_attributes_not_high_cardinality() {
        let now = DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let attrs = vec![profile_with_samples(1.0, 0.0, 950, 1000), profile_with_samples(1.0, 0.0, 10, 1000)];
        let report = score_quality("Transaction", &attrs, Some(now), now);
        assert!((report.cardinality_component - 0.5).abs() < 1e-9);
    }
}
