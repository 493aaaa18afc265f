//! Cache-key derivation: tool id + sorted
//! canonical JSON of effective parameters + account scope + session id
//! (only when the tool descriptor marks results session-scoped). Case,
//! whitespace, and key ordering are normalised.

use serde_json::Value;

pub fn derive_cache_key(tool_id: &str, params: &Value, account_scope: &str, session_id: Option<&str>) -> String {
    let canonical = canonicalize(params);
    let mut key = format!("{tool_id}|{account_scope}|{canonical}");
    if let Some(session_id) = session_id {
        key.push('|');
        key.push_str(session_id);
    }
    key
}

/// Produces a stable JSON text with object keys sorted, independent of
/// insertion order, and with no incidental whitespace.
fn canonicalize(value: &Value) -> String {
    serde_json::to_string(&sort_value(value)).unwrap_or_default()
}

fn sort_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> =
                map.iter().map(|(k, v)| (k.trim().to_ascii_lowercase(), sort_value(v))).collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = serde_json::Map::new();
            for (k, v) in entries {
                sorted.insert(k, v);
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_value).collect()),
        other => other.clone(),
    }
}
