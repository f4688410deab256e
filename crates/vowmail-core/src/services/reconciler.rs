/// Webhook reconciler: folds provider delivery events back into the outbox.
use crate::error::VowmailError;
use crate::models::{BounceType, EmailStatus, ProviderEvent, WebhookSummary};
use crate::services::outbox::OutboxStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Applies a batch of provider events to the outbox. Events the pipeline has
/// no use for (deferrals, spam reports, unsubscribes, unrecognized kinds,
/// unmatched message ids) are skipped without counting as errors; a storage
/// failure on one event is counted but never aborts the rest of the batch.
pub async fn reconcile(
    outbox: &Arc<dyn OutboxStore>,
    events: &[ProviderEvent],
) -> WebhookSummary {
    let mut summary = WebhookSummary::default();

    for event in events {
        match apply_event(outbox, event).await {
            Ok(applied) => {
                if applied {
                    summary.processed += 1;
                }
            }
            Err(e) => {
                warn!(
                    event = %event.event,
                    provider_message_id = event.provider_message_id.as_deref().unwrap_or(""),
                    error = %e,
                    "Failed to reconcile provider event"
                );
                summary.errors += 1;
            }
        }
    }

    info!(
        processed = summary.processed,
        errors = summary.errors,
        total = events.len(),
        "Webhook batch reconciled"
    );
    summary
}

/// Applies one event. Returns Ok(false) for events that are deliberately
/// ignored, Ok(true) when the outbox was consulted for a delivery outcome.
async fn apply_event(
    outbox: &Arc<dyn OutboxStore>,
    event: &ProviderEvent,
) -> Result<bool, VowmailError> {
    let (status, bounce_type, bounce_reason) = match event.event.as_str() {
        "delivered" => (EmailStatus::Delivered, None, None),
        "bounce" => {
            // Only the provider's "hard" classification is a hard bounce;
            // anything else (soft, blocked, absent) stays soft.
            let bounce_type = if event.bounce_class.as_deref() == Some("hard") {
                BounceType::Hard
            } else {
                BounceType::Soft
            };
            (
                EmailStatus::Bounced,
                Some(bounce_type),
                Some(event.failure_reason()),
            )
        }
        // A drop means the provider refused to even attempt delivery;
        // treated as a hard bounce for suppression purposes.
        "dropped" => (
            EmailStatus::Bounced,
            Some(BounceType::Hard),
            Some(event.failure_reason()),
        ),
        other => {
            debug!(event = other, "Ignoring provider event kind");
            return Ok(false);
        }
    };

    let Some(message_id) = event
        .provider_message_id
        .as_deref()
        .filter(|id| !id.is_empty())
    else {
        debug!(event = %event.event, "Ignoring event without a message id");
        return Ok(false);
    };

    // An id we never sent is a no-op, not a batch error; providers replay
    // history and may reference messages sent before this deployment.
    let Some(record) = outbox.find_by_provider_message_id(message_id).await? else {
        warn!(
            event = %event.event,
            provider_message_id = message_id,
            "No outbox record for provider event, skipping"
        );
        return Ok(false);
    };

    outbox
        .record_delivery(&record.id, status, bounce_type, bounce_reason)
        .await?;
    Ok(true)
}
