//! Schema discovery (spec.md §4.6 "Schema discovery"): enumerates schemas
//! whose observation count in the window exceeds a minimum, via a single
//! broad enumeration query.

use serde::Deserialize;

use crate::model::DiscoveredSchema;

/// The GraphQL query issued once per `discover_schemas` call (spec.md
/// §4.6: "a single broad schema-enumeration query and a per-schema sample
/// count").
pub fn enumeration_query() -> &'static str {
    "query SchemaEnumeration($window: TimeWindow!) { schemas(window: $window) { name count } }"
}

#[derive(Debug, Deserialize)]
struct RawSchema {
    name: String,
    count: u64,
}

#[derive(Debug, Deserialize)]
struct RawSchemaEnumeration {
    schemas: Vec<RawSchema>,
}

/// Parses the enumeration query's `data` payload, filtering out schemas
/// below `min_observation_count` (spec.md §4.6).
pub fn parse_enumeration(data: &serde_json::Value, min_observation_count: u64) -> Result<Vec<DiscoveredSchema>, String> {
    let raw: RawSchemaEnumeration = serde_json::from_value(data.clone()).map_err(|e| e.to_string())?;
    Ok(raw
        .schemas
        .into_iter()
        .filter(|s| s.count >= min_observation_count)
        .map(|s| DiscoveredSchema { name: s.name, observed_sample_count: s.count, attributes: Vec::new() })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filters_schemas_below_the_minimum_observation_count() {
        let data = json!({
            "schemas": [
                {"name": "Transaction", "count": 1000},
                {"name": "RareEvent", "count": 0},
            ]
        });
        let schemas = parse_enumeration(&data, 1).unwrap();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].name, "Transaction");
    }
}
