//! The two transport loops named in SPEC_FULL.md §6: newline-delimited
//! JSON-RPC over stdio, and a single `axum` HTTP POST endpoint. Both share
//! the same [`Dispatcher`] and go through [`handle_message`] so framing is
//! the only thing that differs between them.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use ogw_protocol::{dispatch_message, InboundMessage, OutboundMessage, RequestEnvelope, RequestId, ResponseEnvelope};
use ogw_tools::Dispatcher;

const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_secs(60);

/// Runs one request through the dispatcher and frames the result as a
/// `ResponseEnvelope`. Shared by both transports (spec.md §6: "Both
/// transports share the same dispatcher").
async fn handle_request(dispatcher: &Dispatcher, req: RequestEnvelope) -> ResponseEnvelope {
    let id = req.id.clone().unwrap_or(RequestId::Null);
    let request_id = match &req.id {
        Some(RequestId::String(s)) => Some(s.clone()),
        Some(RequestId::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    let session_id = req.params.get("session_id").and_then(Value::as_str).map(str::to_string);

    match dispatcher.handle(&req.method, &req.params, session_id, request_id, DEFAULT_REQUEST_DEADLINE).await {
        Ok(result) => ResponseEnvelope::success(id, result),
        Err(err) => ResponseEnvelope::failure(id, err),
    }
}

async fn handle_message(dispatcher: &Dispatcher, message: InboundMessage) -> OutboundMessage {
    dispatch_message(message, |req| async move { handle_request(dispatcher, req).await }).await
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// stdio transport
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Reads newline-delimited JSON-RPC messages from stdin, dispatches them,
/// and writes newline-delimited responses to stdout. Runs until stdin
/// closes.
pub async fn serve_stdio(dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let outbound = match serde_json::from_str::<InboundMessage>(line) {
            Ok(message) => handle_message(&dispatcher, message).await,
            Err(_) => OutboundMessage::Single(ResponseEnvelope::failure(
                RequestId::Null,
                ogw_protocol::JsonRpcError::parse_error(),
            )),
        };

        if let Some(text) = render(outbound) {
            stdout.write_all(text.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}

fn render(outbound: OutboundMessage) -> Option<String> {
    match outbound {
        OutboundMessage::None => None,
        other => serde_json::to_string(&other).ok(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HTTP transport
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone)]
struct HttpState {
    dispatcher: Arc<Dispatcher>,
}

/// Builds the `/rpc` + `/healthz` router (spec.md §6, ambient liveness
/// surface per SPEC_FULL.md §4.2).
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/rpc", post(rpc_handler))
        .route("/healthz", get(healthz))
        .with_state(HttpState { dispatcher })
}

async fn rpc_handler(State(state): State<HttpState>, Json(body): Json<Value>) -> impl IntoResponse {
    let message: InboundMessage = match serde_json::from_value(body) {
        Ok(m) => m,
        Err(_) => {
            let resp = ResponseEnvelope::failure(RequestId::Null, ogw_protocol::JsonRpcError::parse_error());
            return (StatusCode::OK, Json(serde_json::to_value(&resp).unwrap_or(Value::Null)));
        }
    };

    let outbound = handle_message(&state.dispatcher, message).await;
    let body = match outbound {
        OutboundMessage::None => Value::Null,
        other => serde_json::to_value(&other).unwrap_or(Value::Null),
    };
    (StatusCode::OK, Json(body))
}

async fn healthz(State(state): State<HttpState>) -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "tools": state.dispatcher.registry().list().len() }))
}

pub async fn serve_http(dispatcher: Arc<Dispatcher>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = router(dispatcher);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "ogw-gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}
