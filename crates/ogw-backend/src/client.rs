//! Real `BackendTransport` over a pooled `reqwest::Client`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::transport::{BackendTransport, GraphQlError, GraphQlRequest, GraphQlResponse, TransportError};

/// Single shared client issuing GraphQL POSTs, reused across concurrent
/// calls. Pool size is bounded via `reqwest`'s per-host idle-connection
/// cap, configured at construction so connections are reused across
/// concurrent calls rather than opened per request.
pub struct HttpBackendTransport {
    client: reqwest::Client,
    endpoint_url: String,
    credential: String,
}

impl HttpBackendTransport {
    pub fn new(endpoint_url: impl Into<String>, credential: impl Into<String>, pool_size: usize) -> Self {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(pool_size)
            .build()
            .expect("reqwest client builds with static TLS config");
        Self {
            client,
            endpoint_url: endpoint_url.into(),
            credential: credential.into(),
        }
    }
}

#[derive(Deserialize)]
struct RawGraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[async_trait]
impl BackendTransport for HttpBackendTransport {
    async fn execute(&self, request: GraphQlRequest, deadline: Duration) -> Result<GraphQlResponse, TransportError> {
        let account_id = request.account_id.clone();
        let body = serde_json::json!({
            "query": request.query,
            "variables": request.variables,
        });

        let send = self
            .client
            .post(&self.endpoint_url)
            .bearer_auth(&self.credential)
            .header("X-Account-Id", account_id)
            .timeout(deadline)
            .json(&body)
            .send();

        let response = tokio::time::timeout(deadline, send)
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::HttpStatus(status.as_u16()));
        }

        let parsed: RawGraphQlResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Network(format!("decoding response: {e}")))?;

        Ok(GraphQlResponse {
            data: parsed.data,
            errors: parsed.errors,
        })
    }
}
