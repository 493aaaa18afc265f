//! JSON-RPC 2.0 request/response envelope types (spec.md §3 "Request
//! Envelope" / "Response Envelope", §6 wire protocol, §8 invariants 1-2/13).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::JsonRpcError;

pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC request id: string, integer, or `null`. `null`/absent marks a
/// notification (spec.md §3: "A request with missing id is a notification").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
    Null,
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::Null => write!(f, "null"),
        }
    }
}

/// A single inbound JSON-RPC request.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: Option<RequestId>,
}

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

impl RequestEnvelope {
    /// A request with no `id` field at all, or an explicit `id: null`, is a
    /// notification: no response is ever produced for it.
    pub fn is_notification(&self) -> bool {
        matches!(self.id, None | Some(RequestId::Null))
    }

    /// Correlation id derived from the request id; a fresh process-local id
    /// is minted for tracing when the inbound id is absent (spec.md §3).
    pub fn correlation_id(&self) -> CorrelationId {
        match &self.id {
            Some(id) => CorrelationId::FromRequest(id.clone()),
            None => CorrelationId::Generated(Uuid::new_v4()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum CorrelationId {
    FromRequest(RequestId),
    Generated(Uuid),
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorrelationId::FromRequest(id) => write!(f, "{id}"),
            CorrelationId::Generated(uuid) => write!(f, "trace:{uuid}"),
        }
    }
}

/// A batch is either a single request or an array of requests (spec.md §4.8
/// / §8 invariant about order preservation).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InboundMessage {
    Single(RequestEnvelope),
    Batch(Vec<RequestEnvelope>),
}

/// A single outbound JSON-RPC response. Exactly one of `result`/`error` is
/// set (spec.md §8 invariant 2).
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: RequestId,
}

impl ResponseEnvelope {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: RequestId, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// An outbound message mirrors the inbound shape: a single response or an
/// array, preserving the request order (spec.md §8 property "Requests
/// within a batch array are returned in the same order as received").
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    Single(ResponseEnvelope),
    Batch(Vec<ResponseEnvelope>),
    /// A batch made entirely of notifications produces no response body.
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_has_no_id() {
        let req: RequestEnvelope =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"tools/list"}"#).unwrap();
        assert!(req.is_notification());

        let req: RequestEnvelope =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"tools/list","id":null}"#).unwrap();
        assert!(req.is_notification());
    }

    #[test]
    fn request_with_id_is_not_a_notification() {
        let req: RequestEnvelope =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"tools/list","id":1}"#).unwrap();
        assert!(!req.is_notification());
        assert_eq!(req.id, Some(RequestId::Number(1)));
    }

    #[test]
    fn batch_array_deserializes() {
        let msg: InboundMessage = serde_json::from_str(
            r#"[{"jsonrpc":"2.0","method":"a","id":1},{"jsonrpc":"2.0","method":"b","id":"x"}]"#,
        )
        .unwrap();
        match msg {
            InboundMessage::Batch(reqs) => assert_eq!(reqs.len(), 2),
            InboundMessage::Single(_) => panic!("expected batch"),
        }
    }

    #[test]
    fn response_serializes_result_xor_error() {
        let ok = ResponseEnvelope::success(RequestId::Number(1), serde_json::json!({"a":1}));
        let json = serde_json::to_value(&ok).unwrap();
        assert!(json.get("result").is_some());
        assert!(json.get("error").is_none());
    }
}
