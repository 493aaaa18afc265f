//! Correlation ids and structured trace events emitted across the gateway.

use serde::Serialize;
use uuid::Uuid;

/// A process-local id minted when an inbound request carries no JSON-RPC
/// `id` (i.e. is a notification) but we still want something to correlate
/// logs/spans by. Never sent back to the caller.
pub fn new_trace_id() -> Uuid {
    Uuid::new_v4()
}

/// Structured trace events emitted across all gateway crates via
/// [`TraceEvent::emit`]. Mirrors the "one structured log line per
/// significant transition" convention used throughout the component design.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    CacheHit {
        key: String,
        tier: &'static str,
    },
    CacheMiss {
        key: String,
    },
    CacheEvicted {
        key: String,
        reason: &'static str,
    },
    SingleFlightCoalesced {
        key: String,
        waiters: usize,
    },
    CircuitTransition {
        from: &'static str,
        to: &'static str,
        consecutive_failures: u32,
    },
    RateLimited {
        tool_class: String,
        retry_after_secs: f64,
    },
    RetryAttempt {
        attempt: u32,
        max_attempts: u32,
        delay_ms: u64,
        reason: String,
    },
    SessionCreated {
        session_id: String,
    },
    SessionEvicted {
        session_id: String,
        reason: &'static str,
    },
    DiscoveryJobTransition {
        job_id: String,
        from: &'static str,
        to: &'static str,
    },
    ToolDispatched {
        tool: String,
        safety: &'static str,
        dry_run: bool,
        request_id: Option<String>,
    },
    ToolAudit {
        tool: String,
        safety: &'static str,
        outcome: &'static str,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "ogw_event");
    }
}
