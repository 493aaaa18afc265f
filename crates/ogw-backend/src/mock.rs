//! Mock `BackendTransport`: substitutable at the same seam as
//! [`crate::client::HttpBackendTransport`], preserving failure semantics
//! rather than only ever returning a happy path.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::transport::{BackendTransport, GraphQlRequest, GraphQlResponse, TransportError};

/// A single scripted outcome for the next `execute()` call.
#[derive(Debug, Clone)]
pub enum Scripted {
    Success(Value),
    GraphQlErrors(Vec<String>),
    Network,
    Timeout,
    HttpStatus(u16),
}

/// Records every call made to it and replays a scripted sequence of
/// outcomes, falling back to a default success once the script is
/// exhausted — useful for circuit-breaker/retry tests that need N
/// scripted failures followed by indefinite health.
pub struct MockBackend {
    script: Mutex<VecDeque<Scripted>>,
    default: Value,
    call_count: AtomicU64,
    calls: Mutex<Vec<GraphQlRequest>>,
}

impl MockBackend {
    pub fn new(default_success: Value) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default: default_success,
            call_count: AtomicU64::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, outcome: Scripted) {
        self.script.lock().push_back(outcome);
    }

    pub fn push_n(&self, outcome: Scripted, n: usize) {
        let mut script = self.script.lock();
        for _ in 0..n {
            script.push_back(outcome.clone());
        }
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every request observed so far, in order — used by Scenario E (dry
    /// run must not reach this log) and Scenario C (single-flight
    /// dedup: at most one call observed for N concurrent identical
    /// requests).
    pub fn calls(&self) -> Vec<GraphQlRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl BackendTransport for MockBackend {
    async fn execute(&self, request: GraphQlRequest, _deadline: Duration) -> Result<GraphQlResponse, TransportError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(request);

        let next = self.script.lock().pop_front();
        match next {
            None => Ok(GraphQlResponse {
                data: Some(self.default.clone()),
                errors: Vec::new(),
            }),
            Some(Scripted::Success(data)) => Ok(GraphQlResponse {
                data: Some(data),
                errors: Vec::new(),
            }),
            Some(Scripted::GraphQlErrors(messages)) => Ok(GraphQlResponse {
                data: None,
                errors: messages
                    .into_iter()
                    .map(|message| crate::transport::GraphQlError { message, extensions: None })
                    .collect(),
            }),
            Some(Scripted::Network) => Err(TransportError::Network("mock network failure".into())),
            Some(Scripted::Timeout) => Err(TransportError::Timeout),
            Some(Scripted::HttpStatus(code)) => Err(TransportError::HttpStatus(code)),
        }
    }
}
