/// Immediate and queued batch behavior through the full pipeline.
mod common;

use common::{MockTransport, guest, pipeline_with, seed_three_guests};
use std::sync::Arc;
use vowmail_core::error::VowmailError;
use vowmail_core::models::{EmailStatus, EmailType};
use vowmail_core::services::directory::Directory;
use vowmail_core::services::queue::{DeliveryQueue, JobData, PendingJob, QueuedJob};

#[tokio::test]
async fn test_batch_failure_isolation() {
    let t = pipeline_with(MockTransport::succeeding());
    seed_three_guests(&t).await;

    let report = t
        .pipeline
        .send_batch(
            "w-1",
            &[
                "g-1".to_string(),
                "g-2".to_string(),
                "g-3".to_string(),
            ],
            EmailType::Invitation,
        )
        .await
        .unwrap();

    assert_eq!(report.sent, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.total, 3);
    assert_eq!(t.transport.sends(), 2);

    let failed_row = report.results.iter().find(|r| !r.success).unwrap();
    assert_eq!(failed_row.guest_id, "g-2");
    assert!(failed_row.error.is_some());

    // Only the successful sends have outbox records in `sent`
    let records = t.outbox.list_for_wedding("w-1").await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.status == EmailStatus::Sent));
    assert!(records.iter().all(|r| r.provider_message_id.is_some()));
}

#[tokio::test]
async fn test_invitation_send_stamps_invite_sent() {
    let t = pipeline_with(MockTransport::succeeding());
    seed_three_guests(&t).await;

    t.pipeline
        .send_batch("w-1", &["g-1".to_string()], EmailType::Invitation)
        .await
        .unwrap();

    let stamped = t.directory.find_guest("g-1").await.unwrap().unwrap();
    assert!(stamped.invite_sent_at.is_some());

    // Non-invitation types leave the stamp untouched
    t.pipeline
        .send_batch("w-1", &["g-3".to_string()], EmailType::ThankYou)
        .await
        .unwrap();
    let other = t.directory.find_guest("g-3").await.unwrap().unwrap();
    assert!(other.invite_sent_at.is_none());
}

#[tokio::test]
async fn test_transport_failure_is_data_not_error() {
    let t = pipeline_with(MockTransport::failing_for(&["clara@example.com"]));
    seed_three_guests(&t).await;

    let report = t
        .pipeline
        .send_batch(
            "w-1",
            &["g-1".to_string(), "g-3".to_string()],
            EmailType::Update,
        )
        .await
        .unwrap();

    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 1);

    // The admin-facing row carries the normalized reason, not provider text
    let failed_row = report.results.iter().find(|r| !r.success).unwrap();
    assert_eq!(failed_row.error.as_deref(), Some("email delivery failed"));
    assert!(!failed_row.error.as_deref().unwrap().contains("451"));

    // The record keeps the raw error for operators
    let records = t.outbox.list_for_wedding("w-1").await.unwrap();
    let failed_record = records
        .iter()
        .find(|r| r.status == EmailStatus::Failed)
        .unwrap();
    assert!(failed_record.last_error.as_deref().unwrap().contains("451"));
}

#[tokio::test]
async fn test_send_batch_requires_wedding_and_guests() {
    let t = pipeline_with(MockTransport::succeeding());

    let missing = t
        .pipeline
        .send_batch("w-missing", &["g-1".to_string()], EmailType::Invitation)
        .await;
    assert!(matches!(missing, Err(VowmailError::WeddingNotFound(_))));

    seed_three_guests(&t).await;
    let empty = t
        .pipeline
        .send_batch("w-1", &[], EmailType::Invitation)
        .await;
    assert!(matches!(empty, Err(VowmailError::NoGuestsSelected)));
}

#[tokio::test]
async fn test_queue_batch_creates_pending_records_and_jobs() {
    let t = pipeline_with(MockTransport::succeeding());
    seed_three_guests(&t).await;

    let report = t
        .pipeline
        .queue_batch(
            "w-1",
            &["g-1".to_string(), "g-3".to_string()],
            EmailType::Reminder,
        )
        .await
        .unwrap();

    assert_eq!(report.queued, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.total, 2);
    assert!(report.failures.is_empty());

    // Nothing sent yet; records wait for the worker
    assert_eq!(t.transport.sends(), 0);
    let records = t.outbox.list_for_wedding("w-1").await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.status == EmailStatus::Pending));

    // Job id == outbox record id, payload pre-rendered
    for job_id in &report.job_ids {
        let job = t.queue.find(job_id).await.unwrap().unwrap();
        match job.data {
            JobData::SendEmail { outbox_id, email, .. } => {
                assert_eq!(&outbox_id, job_id);
                assert!(email.html_body.contains("rsvp?token="));
            }
            other => panic!("unexpected job payload: {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_queue_batch_reports_invalid_guest_as_failure() {
    let t = pipeline_with(MockTransport::succeeding());
    seed_three_guests(&t).await;

    let report = t
        .pipeline
        .queue_batch(
            "w-1",
            &["g-1".to_string(), "g-2".to_string()],
            EmailType::Reminder,
        )
        .await
        .unwrap();

    assert_eq!(report.queued, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.total, 2);

    // The broken guest is not silently dropped; admins see a row for them
    assert_eq!(report.failures.len(), 1);
    let row = &report.failures[0];
    assert_eq!(row.guest_id, "g-2");
    assert!(!row.success);
    assert!(row.error.as_deref().is_some_and(|e| !e.is_empty()));
}

/// Queue double that refuses every enqueue, simulating an outage.
struct BrokenQueue;

#[async_trait::async_trait]
impl DeliveryQueue for BrokenQueue {
    async fn enqueue_immediate(
        &self,
        _jobs: Vec<(String, JobData)>,
    ) -> Result<Vec<String>, VowmailError> {
        Err(VowmailError::Queue("backend unavailable".to_string()))
    }

    async fn schedule_delayed(
        &self,
        _job_id: String,
        _data: JobData,
        _fire_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<String, VowmailError> {
        Err(VowmailError::Queue("backend unavailable".to_string()))
    }

    async fn cancel(&self, _job_id: &str) -> Result<bool, VowmailError> {
        Ok(false)
    }

    async fn list_pending(&self, _wedding_id: &str) -> Result<Vec<PendingJob>, VowmailError> {
        Ok(Vec::new())
    }

    async fn find(&self, _job_id: &str) -> Result<Option<QueuedJob>, VowmailError> {
        Ok(None)
    }

    async fn claim_due(&self, _limit: usize) -> Result<Vec<QueuedJob>, VowmailError> {
        Ok(Vec::new())
    }

    async fn complete(&self, _job_id: &str) -> Result<(), VowmailError> {
        Ok(())
    }

    async fn fail(
        &self,
        _job_id: &str,
        _reason: &str,
        _retriable: bool,
    ) -> Result<(), VowmailError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_queue_outage_fails_affected_records() {
    use vowmail_core::email::EmailComposer;
    use vowmail_core::services::directory::InMemoryDirectory;
    use vowmail_core::services::outbox::{InMemoryOutboxStore, OutboxStore};
    use vowmail_core::services::scheduler::EmailPipeline;
    use vowmail_core::services::transport::TransportSender;

    let outbox: Arc<dyn OutboxStore> = Arc::new(InMemoryOutboxStore::new());
    let queue: Arc<dyn DeliveryQueue> = Arc::new(BrokenQueue);
    let transport: Arc<dyn TransportSender> = Arc::new(MockTransport::succeeding());
    let directory = Arc::new(InMemoryDirectory::new());
    directory.insert_wedding(common::wedding()).await;
    directory
        .insert_guest(guest("g-1", "Clara", "clara@example.com"))
        .await;

    let pipeline = EmailPipeline::new(
        outbox.clone(),
        queue,
        transport,
        directory.clone(),
        directory,
        EmailComposer::new("https://vowmail.example.com"),
    );

    let result = pipeline
        .queue_batch("w-1", &["g-1".to_string()], EmailType::Reminder)
        .await;
    assert!(matches!(result, Err(VowmailError::ReminderQueueFailed(_))));

    // The already-created record is failed with the outage noted
    let records = outbox.list_for_wedding("w-1").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, EmailStatus::Failed);
    assert!(records[0].last_error.is_some());
}
