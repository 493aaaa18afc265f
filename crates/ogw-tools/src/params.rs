//! Parameter validation and coercion (spec.md §4.7 step 2): rejects
//! unknown parameters, fills in defaults, and coerces numeric-looking
//! strings to numbers only where the schema allows it.

use serde_json::{Map, Value};

use crate::descriptor::{ParameterSpec, ParameterType};

#[derive(Debug, Clone)]
pub struct ParamError {
    pub field: String,
    pub message: String,
}

/// Validates and coerces `params` against `schema`, returning the effective
/// parameter object (defaults filled in) or the first offending field
/// (spec.md §4.7 step 2: "On mismatch, `invalid_params` with the first
/// offending field").
pub fn validate_and_coerce(params: &Value, schema: &[ParameterSpec]) -> Result<Value, ParamError> {
    let input = match params {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        _ => {
            return Err(ParamError { field: "params".into(), message: "parameters must be a JSON object".into() });
        }
    };

    let known: std::collections::HashSet<&str> = schema.iter().map(|p| p.name).collect();
    if let Some(unknown_key) = input.keys().find(|k| !known.contains(k.as_str())) {
        return Err(ParamError { field: unknown_key.clone(), message: format!("unknown parameter: {unknown_key}") });
    }

    let mut effective = Map::new();
    for spec in schema {
        match input.get(spec.name) {
            Some(value) => {
                let coerced = coerce(value, spec.param_type).ok_or_else(|| ParamError {
                    field: spec.name.to_string(),
                    message: format!("parameter \"{}\" must be of type {:?}", spec.name, spec.param_type),
                })?;
                effective.insert(spec.name.to_string(), coerced);
            }
            None => {
                if spec.required {
                    return Err(ParamError {
                        field: spec.name.to_string(),
                        message: format!("missing required parameter: {}", spec.name),
                    });
                }
                if let Some(default) = &spec.default {
                    effective.insert(spec.name.to_string(), default.clone());
                }
            }
        }
    }

    Ok(Value::Object(effective))
}

/// Accepts a value already matching `expected`, or a numeric-looking
/// string when `expected` is `Integer`/`Number` (spec.md §4.7 step 2:
/// "Coerce numeric-looking strings to numbers only where the schema
/// allows").
fn coerce(value: &Value, expected: ParameterType) -> Option<Value> {
    match (expected, value) {
        (ParameterType::String, Value::String(_)) => Some(value.clone()),
        (ParameterType::Boolean, Value::Bool(_)) => Some(value.clone()),
        (ParameterType::Array, Value::Array(_)) => Some(value.clone()),
        (ParameterType::Object, Value::Object(_)) => Some(value.clone()),
        (ParameterType::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Some(value.clone()),
        (ParameterType::Number, Value::Number(_)) => Some(value.clone()),
        (ParameterType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(|n| Value::from(n)),
        (ParameterType::Number, Value::String(s)) => s.trim().parse::<f64>().ok().map(|n| Value::from(n)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required("schema", "schema name", ParameterType::String),
            ParameterSpec::optional("limit", "max results", ParameterType::Integer, json!(100)),
        ]
    }

    #[test]
    fn missing_required_field_is_reported() {
        let err = validate_and_coerce(&json!({}), &schema()).unwrap_err();
        assert_eq!(err.field, "schema");
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let err = validate_and_coerce(&json!({"schema": "Transaction", "bogus": 1}), &schema()).unwrap_err();
        assert_eq!(err.field, "bogus");
    }

    #[test]
    fn defaults_are_filled_in() {
        let effective = validate_and_coerce(&json!({"schema": "Transaction"}), &schema()).unwrap();
        assert_eq!(effective["limit"], json!(100));
    }

    #[test]
    fn numeric_looking_strings_are_coerced_where_allowed() {
        let effective = validate_and_coerce(&json!({"schema": "Transaction", "limit": "50"}), &schema()).unwrap();
        assert_eq!(effective["limit"], json!(50));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = validate_and_coerce(&json!({"schema": 123}), &schema()).unwrap_err();
        assert_eq!(err.field, "schema");
    }
}
