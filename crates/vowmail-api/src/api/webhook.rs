/// Provider webhook ingestion endpoint
use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use std::sync::Arc;
use tracing::{info, warn};
use vowmail_core::constants::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use vowmail_core::models::{ProviderEvent, WebhookSummary};
use vowmail_core::services::reconciler;

use crate::{context::ApiContext, crypto, error::ApiError};

/// Receives a provider event batch. When a webhook secret is configured the
/// signature is verified over the raw bytes before anything is parsed; a
/// mismatch rejects the entire batch with 401 and no event is applied.
pub async fn provider(
    State(ctx): State<Arc<ApiContext>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookSummary>, ApiError> {
    if let Some(secret) = &ctx.webhook_secret {
        let signature = header_value(&headers, SIGNATURE_HEADER);
        let timestamp = header_value(&headers, TIMESTAMP_HEADER);
        crypto::verify_webhook_signature(secret, timestamp, &body, signature)?;
    }

    let events = parse_events(&body)?;
    info!(count = events.len(), "Received provider webhook batch");

    let summary = reconciler::reconcile(&ctx.outbox, &events).await;
    Ok(Json(summary))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Parses the batch item by item. A malformed event is skipped with a
/// warning; it neither fails the request nor counts as a processing error.
fn parse_events(body: &[u8]) -> Result<Vec<ProviderEvent>, ApiError> {
    let raw: Vec<serde_json::Value> = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid webhook payload: {}", e)))?;

    let mut events = Vec::with_capacity(raw.len());
    for value in raw {
        match serde_json::from_value::<ProviderEvent>(value) {
            Ok(event) => events.push(event),
            Err(e) => warn!(error = %e, "Skipping malformed provider event"),
        }
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_events_skips_malformed_entries() {
        let body = br#"[
            {"event": "delivered", "sg_message_id": "abc123.filter1", "email": "a@example.com"},
            {"unexpected": 42},
            {"event": "bounce", "sg_message_id": "def456", "email": "b@example.com", "type": "hard"}
        ]"#;

        let events = parse_events(body).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "delivered");
        assert_eq!(
            events[0].provider_message_id.as_deref(),
            Some("abc123.filter1")
        );
        assert_eq!(events[1].bounce_class.as_deref(), Some("hard"));
    }

    #[test]
    fn test_parse_events_rejects_non_array_payload() {
        assert!(parse_events(b"{\"event\": \"delivered\"}").is_err());
        assert!(parse_events(b"not json").is_err());
    }
}
