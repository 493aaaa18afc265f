//! The Backend Transport seam. `BackendTransport` is implemented twice:
//! [`crate::client::HttpBackendTransport`] (real GraphQL POST over a pooled
//! `reqwest::Client`) and [`crate::mock::MockBackend`] (canned responses
//! for tests), mirroring a transport-with-two-impls pattern.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A GraphQL request bound for the Backend.
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest {
    pub query: String,
    #[serde(default)]
    pub variables: Value,
    #[serde(skip)]
    pub account_id: String,
}

impl GraphQlRequest {
    pub fn new(query: impl Into<String>, variables: Value, account_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables,
            account_id: account_id.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct GraphQlResponse {
    pub data: Option<Value>,
    pub errors: Vec<GraphQlError>,
}

impl GraphQlResponse {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// A transport-level failure, distinct from GraphQL-level errors which live
/// inside a successful [`GraphQlResponse`] and are propagated without
/// interpretation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("HTTP {0}")]
    HttpStatus(u16),
}

impl TransportError {
    /// Failures counted toward circuit-breaker/retry state: transport
    /// errors, timeouts, and 5xx responses.
    pub fn counts_as_breaker_failure(&self) -> bool {
        match self {
            TransportError::Network(_) | TransportError::Timeout => true,
            TransportError::HttpStatus(code) => *code >= 500,
        }
    }

    /// Retriable: network/timeout/502/503/504. 429 is handled by the
    /// rate_limit path instead, not here.
    pub fn is_retriable(&self) -> bool {
        match self {
            TransportError::Network(_) | TransportError::Timeout => true,
            TransportError::HttpStatus(code) => matches!(code, 502 | 503 | 504),
        }
    }
}

#[async_trait]
pub trait BackendTransport: Send + Sync {
    /// Execute a single GraphQL call with `deadline` as the per-call
    /// timeout. Implementations must not retry or apply circuit-breaking
    /// themselves — that is `ResilientBackend`'s job.
    async fn execute(&self, request: GraphQlRequest, deadline: Duration) -> Result<GraphQlResponse, TransportError>;
}
