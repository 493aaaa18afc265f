//! A single session's state (spec.md §3 "Session"): identity, activity
//! timestamps, and a size-bounded context bag plus per-session discovery
//! cache hook.

use std::time::Instant;

use serde_json::Value;
use std::collections::HashMap;

pub struct Session {
    pub id: String,
    pub created_at: Instant,
    pub last_activity: Instant,
    context: HashMap<String, Value>,
    context_bytes: usize,
}

impl Session {
    pub fn new(id: String) -> Self {
        let now = Instant::now();
        Self { id, created_at: now, last_activity: now, context: HashMap::new(), context_bytes: 0 }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn get_context(&self, key: &str) -> Option<Value> {
        self.context.get(key).cloned()
    }

    /// Returns the new total context size in bytes, or `Err(over_limit)`
    /// containing the size that would have resulted, leaving the context
    /// unmodified (spec.md §4.4: "set operations that would exceed return
    /// `validation_error`").
    pub fn set_context(&mut self, key: String, value: Value, max_bytes: usize) -> Result<usize, usize> {
        let new_size = serde_json::to_vec(&value).map(|b| b.len()).unwrap_or(0);
        let old_size = self
            .context
            .get(&key)
            .and_then(|v| serde_json::to_vec(v).ok())
            .map(|b| b.len())
            .unwrap_or(0);

        let prospective = self.context_bytes - old_size + new_size;
        if prospective > max_bytes {
            return Err(prospective);
        }
        self.context_bytes = prospective;
        self.context.insert(key, value);
        Ok(self.context_bytes)
    }

    pub fn context_bytes(&self) -> usize {
        self.context_bytes
    }

    pub fn is_idle(&self, now: Instant, max_idle: std::time::Duration) -> bool {
        now.saturating_duration_since(self.last_activity) >= max_idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_context_rejects_entries_past_the_size_cap() {
        let mut session = Session::new("s1".into());
        assert!(session.set_context("a".into(), json!("x".repeat(10)), 20).is_ok());
        assert!(session.set_context("b".into(), json!("y".repeat(100)), 20).is_err());
    }

    #[test]
    fn set_context_replacing_an_existing_key_accounts_for_the_old_size() {
        let mut session = Session::new("s1".into());
        session.set_context("a".into(), json!("x".repeat(15)), 20).unwrap();
        assert!(session.set_context("a".into(), json!("y".repeat(15)), 20).is_ok());
    }
}
