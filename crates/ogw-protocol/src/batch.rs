//! Batch dispatch (spec.md §4.8, §8 invariant "requests within a batch
//! array are returned in the same order as received"). Generic over the
//! caller's single-request handler so `ogw-tools`/`ogw-gateway` can plug in
//! the real dispatcher without this crate depending on it.

use std::future::Future;

use futures_util::future::join_all;

use crate::envelope::{InboundMessage, OutboundMessage, RequestEnvelope, ResponseEnvelope};

/// Runs `handle` over every request in `message`, concurrently within a
/// batch, and reassembles responses in the original order. Notifications
/// are still dispatched (their side effects run) but never contribute a
/// response entry.
pub async fn dispatch_message<F, Fut>(message: InboundMessage, handle: F) -> OutboundMessage
where
    F: Fn(RequestEnvelope) -> Fut,
    Fut: Future<Output = ResponseEnvelope>,
{
    match message {
        InboundMessage::Single(req) => {
            if req.is_notification() {
                handle(req).await;
                OutboundMessage::None
            } else {
                OutboundMessage::Single(handle(req).await)
            }
        }
        InboundMessage::Batch(reqs) => {
            let notification_mask: Vec<bool> = reqs.iter().map(|r| r.is_notification()).collect();
            let futures = reqs.into_iter().map(&handle);
            let responses = join_all(futures).await;

            let kept: Vec<ResponseEnvelope> = responses
                .into_iter()
                .zip(notification_mask)
                .filter_map(|(resp, is_notification)| if is_notification { None } else { Some(resp) })
                .collect();

            if kept.is_empty() {
                OutboundMessage::None
            } else {
                OutboundMessage::Batch(kept)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::RequestId;

    #[tokio::test]
    async fn batch_preserves_order() {
        let message: InboundMessage = serde_json::from_str(
            r#"[{"jsonrpc":"2.0","method":"a","id":1},{"jsonrpc":"2.0","method":"b","id":2},{"jsonrpc":"2.0","method":"c","id":3}]"#,
        )
        .unwrap();

        let outbound = dispatch_message(message, |req| async move {
            ResponseEnvelope::success(
                req.id.unwrap_or(RequestId::Null),
                serde_json::json!(req.method),
            )
        })
        .await;

        match outbound {
            OutboundMessage::Batch(responses) => {
                let ids: Vec<_> = responses.iter().map(|r| r.id.to_string()).collect();
                assert_eq!(ids, vec!["1", "2", "3"]);
            }
            _ => panic!("expected batch"),
        }
    }

    #[tokio::test]
    async fn all_notifications_produce_no_response() {
        let message: InboundMessage = serde_json::from_str(
            r#"[{"jsonrpc":"2.0","method":"a"},{"jsonrpc":"2.0","method":"b"}]"#,
        )
        .unwrap();

        let outbound = dispatch_message(message, |req| async move {
            ResponseEnvelope::success(RequestId::Null, serde_json::json!(req.method))
        })
        .await;

        assert!(matches!(outbound, OutboundMessage::None));
    }
}
