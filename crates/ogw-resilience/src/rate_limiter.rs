//! Per-tool-class and global rate limiting (spec.md §4.2), mirroring the
//! teacher's per-agent `QuotaTracker` keyed-map pattern
//! (`gateway/src/runtime/quota.rs`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use ogw_domain::config::RateLimitConfig;
use ogw_domain::error::Result;
use ogw_domain::trace::TraceEvent;

use crate::token_bucket::{TokenBucket, TokenBucketSnapshot};

pub const DEFAULT_CLASS: &str = "default";

/// Owns the global token bucket plus one bucket per configured tool class.
/// A dispatch acquires from both the global bucket and its tool's class
/// bucket before proceeding (spec.md §4.2: "Rate is configured per tool
/// class (default: 100/s global, per-class overrides)").
pub struct RateLimiterRegistry {
    global: Arc<TokenBucket>,
    per_class: RwLock<HashMap<String, Arc<TokenBucket>>>,
    config: RateLimitConfig,
}

impl RateLimiterRegistry {
    pub fn new(config: RateLimitConfig) -> Self {
        let global = Arc::new(TokenBucket::new(config.global_burst, config.global_requests_per_second));
        let mut per_class = HashMap::new();
        for (class, limit) in &config.per_class {
            per_class.insert(
                class.clone(),
                Arc::new(TokenBucket::new(limit.burst, limit.requests_per_second)),
            );
        }
        Self {
            global,
            per_class: RwLock::new(per_class),
            config,
        }
    }

    /// Acquire one token from the global bucket and from `tool_class`'s
    /// bucket (lazily created from the global defaults if the class has no
    /// override), waiting up to `deadline` total.
    pub async fn acquire(&self, tool_class: &str, deadline: Duration) -> Result<()> {
        let start = std::time::Instant::now();
        self.global.acquire(deadline).await.map_err(|e| {
            TraceEvent::RateLimited {
                tool_class: tool_class.to_string(),
                retry_after_secs: deadline.as_secs_f64(),
            }
            .emit();
            e
        })?;

        let remaining = deadline.saturating_sub(start.elapsed());
        self.class_bucket(tool_class).acquire(remaining).await.map_err(|e| {
            TraceEvent::RateLimited {
                tool_class: tool_class.to_string(),
                retry_after_secs: remaining.as_secs_f64(),
            }
            .emit();
            e
        })
    }

    fn class_bucket(&self, tool_class: &str) -> Arc<TokenBucket> {
        if let Some(bucket) = self.per_class.read().get(tool_class) {
            return bucket.clone();
        }
        let mut guard = self.per_class.write();
        guard
            .entry(tool_class.to_string())
            .or_insert_with(|| {
                Arc::new(TokenBucket::new(
                    self.config.global_burst,
                    self.config.global_requests_per_second,
                ))
            })
            .clone()
    }

    pub fn snapshot(&self) -> RateLimiterSnapshot {
        RateLimiterSnapshot {
            global: self.global.snapshot(),
            per_class: self
                .per_class
                .read()
                .iter()
                .map(|(k, v)| (k.clone(), v.snapshot()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RateLimiterSnapshot {
    pub global: TokenBucketSnapshot,
    pub per_class: HashMap<String, TokenBucketSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ogw_domain::config::ToolClassRateLimit;

    #[tokio::test]
    async fn per_class_override_is_independent_of_global() {
        let mut config = RateLimitConfig {
            global_requests_per_second: 1000.0,
            global_burst: 1000.0,
            per_class: HashMap::new(),
        };
        config
            .per_class
            .insert("bulk".into(), ToolClassRateLimit { requests_per_second: 0.0, burst: 1.0 });

        let registry = RateLimiterRegistry::new(config);
        assert!(registry.acquire("bulk", Duration::from_millis(5)).await.is_ok());
        assert!(registry.acquire("bulk", Duration::from_millis(5)).await.is_err());
        // A different class is unaffected.
        assert!(registry.acquire("default", Duration::from_millis(5)).await.is_ok());
    }
}
