/// Durable delayed-job record for scheduled email batches
use super::outbox::EmailType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled email batch. The id doubles as the queue job id, so
/// cancellation is idempotent and race-safe against a worker that has
/// already claimed the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledEmailJob {
    pub id: String,
    pub wedding_id: String,
    pub guest_ids: Vec<String>,
    pub email_type: EmailType,
    /// Target fire time; strictly in the future (UTC) at creation
    pub send_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ScheduledEmailJob {
    pub fn new(
        wedding_id: impl Into<String>,
        guest_ids: Vec<String>,
        email_type: EmailType,
        send_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            wedding_id: wedding_id.into(),
            guest_ids,
            email_type,
            send_at,
            created_at: Utc::now(),
        }
    }
}
