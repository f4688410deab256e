/// Outbox store: durable record of every send attempt and its delivery status
use crate::error::VowmailError;
use crate::models::{
    AttemptUpdate, BounceType, DeliveryStats, EmailOutboxRecord, EmailStatus, EmailType, Guest,
    Wedding,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Strips the provider's `.`-delimited per-recipient suffix from an inbound
/// message id, e.g. `"abc123.filter0007"` -> `"abc123"`.
pub fn strip_provider_suffix(message_id: &str) -> &str {
    message_id.split('.').next().unwrap_or(message_id)
}

/// Durable keyed store of outbox records with a per-id atomic
/// read-modify-write contract. The forward-only status guard lives here so
/// every implementation enforces it.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Creates a `pending` record with attempt count 0.
    async fn create(
        &self,
        guest: &Guest,
        wedding: &Wedding,
        subject: &str,
        email_type: EmailType,
    ) -> Result<EmailOutboxRecord, VowmailError>;

    /// The worker's write path: increments the attempt count, bumps
    /// `updated_at`, and applies the status transition. Setting `sent` also
    /// stamps `sent_at` and stores the provider message id if supplied.
    ///
    /// A `sent` update arriving after a provider-confirmed terminal status
    /// is a logged no-op, never a regression.
    async fn mark_attempt(
        &self,
        id: &str,
        status: EmailStatus,
        update: AttemptUpdate,
    ) -> Result<EmailOutboxRecord, VowmailError>;

    /// The reconciler's write path: applies a provider-confirmed outcome
    /// without touching the send-attempt counter. Idempotent: re-applying
    /// the same terminal event leaves the record unchanged.
    async fn record_delivery(
        &self,
        id: &str,
        status: EmailStatus,
        bounce_type: Option<BounceType>,
        bounce_reason: Option<String>,
    ) -> Result<EmailOutboxRecord, VowmailError>;

    async fn find(&self, id: &str) -> Result<Option<EmailOutboxRecord>, VowmailError>;

    /// Webhook correlation lookup. The inbound id is suffix-stripped before
    /// matching against stored provider message ids.
    async fn find_by_provider_message_id(
        &self,
        provider_message_id: &str,
    ) -> Result<Option<EmailOutboxRecord>, VowmailError>;

    /// All records for a wedding, newest first.
    async fn list_for_wedding(
        &self,
        wedding_id: &str,
    ) -> Result<Vec<EmailOutboxRecord>, VowmailError>;

    async fn stats_for_wedding(&self, wedding_id: &str) -> Result<DeliveryStats, VowmailError>;
}

/// In-memory implementation of the durable-store contract, used by tests and
/// local runs. Per-id atomicity comes from holding the map lock across each
/// read-modify-write.
pub struct InMemoryOutboxStore {
    records: tokio::sync::Mutex<HashMap<String, EmailOutboxRecord>>,
}

impl InMemoryOutboxStore {
    pub fn new() -> Self {
        Self {
            records: tokio::sync::Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryOutboxStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutboxStore for InMemoryOutboxStore {
    async fn create(
        &self,
        guest: &Guest,
        wedding: &Wedding,
        subject: &str,
        email_type: EmailType,
    ) -> Result<EmailOutboxRecord, VowmailError> {
        let record = EmailOutboxRecord::new(
            &guest.id,
            &wedding.id,
            &guest.email,
            &guest.name,
            subject,
            email_type,
        );

        let mut records = self.records.lock().await;
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn mark_attempt(
        &self,
        id: &str,
        status: EmailStatus,
        update: AttemptUpdate,
    ) -> Result<EmailOutboxRecord, VowmailError> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| VowmailError::Storage(format!("outbox record not found: {}", id)))?;

        if record.status.is_terminal_delivery() && status == EmailStatus::Sent {
            debug!(
                outbox_id = id,
                current = record.status.as_str(),
                "Ignoring late sent update after provider-confirmed outcome"
            );
            return Ok(record.clone());
        }

        if !record.status.can_transition(status) {
            return Err(VowmailError::Storage(format!(
                "invalid status transition {} -> {} for record {}",
                record.status.as_str(),
                status.as_str(),
                id
            )));
        }

        record.attempts += 1;
        record.updated_at = Utc::now();
        record.status = status;

        if let Some(error_message) = update.error_message {
            record.last_error = Some(error_message);
        }
        if let Some(provider_message_id) = update.provider_message_id {
            record.provider_message_id = Some(provider_message_id);
        }
        if let Some(bounce_type) = update.bounce_type {
            record.bounce_type = Some(bounce_type);
        }
        if let Some(bounce_reason) = update.bounce_reason {
            record.bounce_reason = Some(bounce_reason);
        }

        if status == EmailStatus::Sent && record.sent_at.is_none() {
            record.sent_at = Some(record.updated_at);
        }

        Ok(record.clone())
    }

    async fn record_delivery(
        &self,
        id: &str,
        status: EmailStatus,
        bounce_type: Option<BounceType>,
        bounce_reason: Option<String>,
    ) -> Result<EmailOutboxRecord, VowmailError> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| VowmailError::Storage(format!("outbox record not found: {}", id)))?;

        // Providers retry webhooks; a repeat of the same terminal outcome
        // must leave the record byte-identical.
        if record.status == status {
            return Ok(record.clone());
        }

        if !record.status.can_transition(status) {
            warn!(
                outbox_id = id,
                current = record.status.as_str(),
                incoming = status.as_str(),
                "Skipping out-of-order provider event"
            );
            return Ok(record.clone());
        }

        let now = Utc::now();
        record.status = status;
        record.updated_at = now;

        match status {
            EmailStatus::Delivered => {
                if record.delivered_at.is_none() {
                    record.delivered_at = Some(now);
                }
            }
            EmailStatus::Bounced => {
                if record.bounced_at.is_none() {
                    record.bounced_at = Some(now);
                }
                record.bounce_type = bounce_type.or(record.bounce_type);
                if bounce_reason.is_some() {
                    record.bounce_reason = bounce_reason;
                }
            }
            _ => {}
        }

        Ok(record.clone())
    }

    async fn find(&self, id: &str) -> Result<Option<EmailOutboxRecord>, VowmailError> {
        let records = self.records.lock().await;
        Ok(records.get(id).cloned())
    }

    async fn find_by_provider_message_id(
        &self,
        provider_message_id: &str,
    ) -> Result<Option<EmailOutboxRecord>, VowmailError> {
        let stripped = strip_provider_suffix(provider_message_id);
        let records = self.records.lock().await;
        Ok(records
            .values()
            .find(|r| r.provider_message_id.as_deref() == Some(stripped))
            .cloned())
    }

    async fn list_for_wedding(
        &self,
        wedding_id: &str,
    ) -> Result<Vec<EmailOutboxRecord>, VowmailError> {
        let records = self.records.lock().await;
        let mut list: Vec<EmailOutboxRecord> = records
            .values()
            .filter(|r| r.wedding_id == wedding_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn stats_for_wedding(&self, wedding_id: &str) -> Result<DeliveryStats, VowmailError> {
        let records = self.records.lock().await;
        let mut stats = DeliveryStats::default();
        for record in records.values().filter(|r| r.wedding_id == wedding_id) {
            stats.total += 1;
            *stats
                .by_status
                .entry(record.status.as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .by_type
                .entry(record.email_type.as_str().to_string())
                .or_insert(0) += 1;
        }
        Ok(stats)
    }
}
