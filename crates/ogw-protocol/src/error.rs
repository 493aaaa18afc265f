//! The JSON-RPC error taxonomy (spec.md §6 canonical code table, §7 error
//! handling design). This is the single place that maps internal
//! `ogw_domain::Error` values (and dispatch-local conditions like "unknown
//! method") onto wire error codes — no other crate improvises one.

use serde::Serialize;

use ogw_domain::Error as DomainError;

/// The complete set of error types surfaced to callers (spec.md §3/§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    Timeout,
    RateLimit,
    Unauthorized,
    PermissionDenied,
    QueryError,
    DataNotFound,
    ValidationError,
    UpstreamError,
    CircuitOpen,
}

impl ErrorType {
    /// Canonical numeric code (spec.md §6 table).
    pub fn code(self) -> i64 {
        match self {
            ErrorType::ParseError => -32700,
            ErrorType::InvalidRequest => -32600,
            ErrorType::MethodNotFound => -32601,
            ErrorType::InvalidParams => -32602,
            ErrorType::InternalError => -32603,
            ErrorType::Timeout => -32603,
            ErrorType::RateLimit => -32001,
            ErrorType::Unauthorized => -32002,
            // Same "not in §6's table" note as QueryError above.
            ErrorType::PermissionDenied => -32006,
            ErrorType::DataNotFound => -32003,
            ErrorType::CircuitOpen => -32004,
            ErrorType::ValidationError => -32602,
            // Not in spec.md §6's table (which only lists 12 of the 14
            // error type names from §3); assigned in the same JSON-RPC
            // "server error" reserved band (-32000..-32099) as rate_limit,
            // unauthorized, data_not_found and circuit_open.
            ErrorType::QueryError => -32007,
            ErrorType::UpstreamError => -32603,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorType::ParseError => "parse_error",
            ErrorType::InvalidRequest => "invalid_request",
            ErrorType::MethodNotFound => "method_not_found",
            ErrorType::InvalidParams => "invalid_params",
            ErrorType::InternalError => "internal_error",
            ErrorType::Timeout => "timeout",
            ErrorType::RateLimit => "rate_limit",
            ErrorType::Unauthorized => "unauthorized",
            ErrorType::PermissionDenied => "permission_denied",
            ErrorType::QueryError => "query_error",
            ErrorType::DataNotFound => "data_not_found",
            ErrorType::ValidationError => "validation_error",
            ErrorType::UpstreamError => "upstream_error",
            ErrorType::CircuitOpen => "circuit_open",
        }
    }

    /// Whether a caller may usefully retry this error class (spec.md §6
    /// "Retriable" column). Informational: it does not drive C2's own
    /// retry loop, which runs below dispatch.
    pub fn is_retriable(self) -> bool {
        matches!(
            self,
            ErrorType::InternalError
                | ErrorType::Timeout
                | ErrorType::RateLimit
                | ErrorType::CircuitOpen
                | ErrorType::UpstreamError
        )
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorData {
    #[serde(rename = "type")]
    pub error_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ErrorData>,
}

impl JsonRpcError {
    pub fn new(kind: ErrorType, message: impl Into<String>) -> Self {
        Self {
            code: kind.code(),
            message: message.into(),
            data: Some(ErrorData {
                error_type: Some(kind.as_str()),
                ..Default::default()
            }),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let data = self.data.get_or_insert_with(Default::default);
        data.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        let data = self.data.get_or_insert_with(Default::default);
        data.details = Some(details);
        self
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        let data = self.data.get_or_insert_with(Default::default);
        data.tool = Some(tool.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        let data = self.data.get_or_insert_with(Default::default);
        data.request_id = Some(request_id.into());
        self
    }

    pub fn parse_error() -> Self {
        Self::new(ErrorType::ParseError, "invalid JSON")
    }

    pub fn method_not_found(method: &str, suggestion: Option<&str>) -> Self {
        let err = Self::new(ErrorType::MethodNotFound, format!("unknown method: {method}"));
        match suggestion {
            Some(s) => err.with_hint(format!("did you mean \"{s}\"?")),
            None => err,
        }
    }

    pub fn invalid_params(field: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorType::InvalidParams, message).with_hint(format!("offending field: {field}"))
    }
}

/// Maps the shared internal error enum onto the wire taxonomy. This is the
/// only conversion path from `ogw_domain::Error` to a caller-visible error;
/// internal variants never leak unmapped (spec.md §7, §3 data model note).
impl From<DomainError> for JsonRpcError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Io(e) => JsonRpcError::new(ErrorType::InternalError, format!("io error: {e}")),
            DomainError::Json(e) => {
                JsonRpcError::new(ErrorType::InternalError, format!("serialization error: {e}"))
            }
            DomainError::Http(msg) => JsonRpcError::new(ErrorType::UpstreamError, msg),
            DomainError::Timeout(msg) => JsonRpcError::new(ErrorType::Timeout, msg),
            DomainError::Backend { message } => JsonRpcError::new(ErrorType::UpstreamError, message),
            DomainError::Validation(msg) => JsonRpcError::new(ErrorType::ValidationError, msg),
            DomainError::QueryValidation { message, offset, token } => {
                JsonRpcError::new(ErrorType::ValidationError, message)
                    .with_hint(format!("offending token: \"{token}\" at offset {offset}"))
                    .with_details(serde_json::json!({ "offset": offset, "token": token }))
            }
            DomainError::RateLimited { retry_after_secs } => {
                JsonRpcError::new(ErrorType::RateLimit, "rate limit exceeded").with_details(
                    serde_json::json!({ "retry_after": retry_after_secs }),
                )
            }
            DomainError::CircuitOpen => {
                JsonRpcError::new(ErrorType::CircuitOpen, "circuit breaker is open")
            }
            DomainError::NotFound(what) => JsonRpcError::new(ErrorType::DataNotFound, what),
            DomainError::Unauthorized(msg) => JsonRpcError::new(ErrorType::Unauthorized, msg),
            DomainError::Config(msg) => JsonRpcError::new(ErrorType::InternalError, msg),
            DomainError::Internal(msg) => JsonRpcError::new(ErrorType::InternalError, msg),
        }
    }
}
