//! Shared error type used across every gateway crate.
//!
//! Lower crates (`ogw-backend`, `ogw-resilience`, `ogw-cache`, ...) return
//! this enum; `ogw-protocol` owns the single mapping from it to the JSON-RPC
//! error taxonomy, so no crate improvises its own error-code translation.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("backend: {message}")]
    Backend { message: String },

    #[error("validation: {0}")]
    Validation(String),

    /// A domain-query validation failure that must keep its offending
    /// token's byte offset for the caller (spec.md §4.5/§8 Scenario B:
    /// "`data.details.offset` pointing at `FORM`"), distinct from the
    /// plain-message [`Error::Validation`] used elsewhere.
    #[error("query validation: {message}")]
    QueryValidation {
        message: String,
        offset: usize,
        token: String,
    },

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: f64 },

    #[error("circuit open")]
    CircuitOpen,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("config: {0}")]
    Config(String),

    #[error("internal: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the originating operation is safe to retry (mirrors the
    /// retriability notes in spec.md §6/§7 — informational only, the actual
    /// retry decision for Backend calls lives in `ogw-resilience`).
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::RateLimited { .. } | Error::CircuitOpen
        ) || matches!(self, Error::Backend { .. })
    }
}
