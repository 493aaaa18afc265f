//! Request/Response Envelope (C8): JSON-RPC 2.0 framing, the error
//! taxonomy mapping shared by every higher crate, and batch dispatch.

pub mod batch;
pub mod envelope;
pub mod error;

pub use batch::dispatch_message;
pub use envelope::{
    CorrelationId, InboundMessage, OutboundMessage, RequestEnvelope, RequestId, ResponseEnvelope,
    JSONRPC_VERSION,
};
pub use error::{ErrorData, ErrorType, JsonRpcError};
