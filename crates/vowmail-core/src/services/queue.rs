/// Durable, at-least-once delivery queue with delayed jobs, per-job retry
/// with backoff, and best-effort cancellation.
use crate::constants::{FAILED_JOBS_RETAINED, QUEUE_MAX_ATTEMPTS, QUEUE_RETRY_BASE_DELAY_SECS};
use crate::email::ComposedEmail;
use crate::error::VowmailError;
use crate::models::ScheduledEmailJob;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Job payloads. Immediate send jobs carry all pre-rendered content so the
/// worker never re-composes; scheduled batches carry only the batch record
/// and re-resolve guests at fire time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobData {
    SendEmail {
        outbox_id: String,
        wedding_id: String,
        email: ComposedEmail,
    },
    ScheduledBatch {
        scheduled: ScheduledEmailJob,
    },
}

impl JobData {
    pub fn wedding_id(&self) -> &str {
        match self {
            Self::SendEmail { wedding_id, .. } => wedding_id,
            Self::ScheduledBatch { scheduled } => &scheduled.wedding_id,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Eligible (or delayed, when `not_before` is in the future)
    Waiting,
    /// Claimed by a worker; cancellation is refused
    Active,
    /// Retries exhausted; retained for operator inspection
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedJob {
    pub id: String,
    pub data: JobData,
    pub state: JobState,
    pub attempts: u32,
    pub not_before: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Admin view of a job that has not run yet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingJob {
    pub job_id: String,
    pub data: JobData,
    pub scheduled_at: DateTime<Utc>,
}

/// Queue contract. Job ids are supplied by the caller (outbox record id or
/// scheduled-email id), which makes enqueueing idempotent and cancellation
/// race-safe by construction.
#[async_trait::async_trait]
pub trait DeliveryQueue: Send + Sync {
    /// Bulk-adds immediately eligible jobs. An id collision is a no-op, not
    /// a duplicate send; the returned ids are those actually added.
    async fn enqueue_immediate(
        &self,
        jobs: Vec<(String, JobData)>,
    ) -> Result<Vec<String>, VowmailError>;

    /// Adds a job eligible at `fire_at` (`delay = max(0, fire_at - now)`).
    async fn schedule_delayed(
        &self,
        job_id: String,
        data: JobData,
        fire_at: DateTime<Utc>,
    ) -> Result<String, VowmailError>;

    /// Best-effort cancellation. Returns false when the job does not exist
    /// or is already `active`/`completed`; never errors over state, and
    /// never races a worker into double execution.
    async fn cancel(&self, job_id: &str) -> Result<bool, VowmailError>;

    /// Waiting/delayed jobs for a wedding; active and completed jobs are
    /// excluded.
    async fn list_pending(&self, wedding_id: &str) -> Result<Vec<PendingJob>, VowmailError>;

    async fn find(&self, job_id: &str) -> Result<Option<QueuedJob>, VowmailError>;

    /// Atomically claims up to `limit` due jobs, flipping them to `active`.
    async fn claim_due(&self, limit: usize) -> Result<Vec<QueuedJob>, VowmailError>;

    /// Marks a claimed job done. Completed jobs are pruned immediately.
    async fn complete(&self, job_id: &str) -> Result<(), VowmailError>;

    /// Reports a claimed job's failure. Retriable failures re-enter the
    /// queue with exponential backoff (base 5s, up to 3 attempts total);
    /// permanent failures and exhausted jobs are retained as `failed`.
    async fn fail(&self, job_id: &str, reason: &str, retriable: bool)
    -> Result<(), VowmailError>;
}

/// In-memory queue satisfying the durable-store contract for tests and
/// local runs: a job table polled by the dispatcher, with per-id atomic
/// state flips under one lock.
pub struct InMemoryDeliveryQueue {
    jobs: tokio::sync::Mutex<HashMap<String, QueuedJob>>,
}

impl InMemoryDeliveryQueue {
    pub fn new() -> Self {
        Self {
            jobs: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    fn backoff(attempts: u32) -> Duration {
        let secs = QUEUE_RETRY_BASE_DELAY_SECS.saturating_mul(2u64.saturating_pow(attempts - 1));
        Duration::seconds(secs as i64)
    }

    fn evict_excess_failed(jobs: &mut HashMap<String, QueuedJob>) {
        let mut failed: Vec<(String, DateTime<Utc>)> = jobs
            .iter()
            .filter(|(_, j)| j.state == JobState::Failed)
            .map(|(id, j)| (id.clone(), j.created_at))
            .collect();
        if failed.len() <= FAILED_JOBS_RETAINED {
            return;
        }
        failed.sort_by_key(|(_, created)| *created);
        let excess = failed.len() - FAILED_JOBS_RETAINED;
        for (id, _) in failed.into_iter().take(excess) {
            jobs.remove(&id);
        }
    }
}

impl Default for InMemoryDeliveryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DeliveryQueue for InMemoryDeliveryQueue {
    async fn enqueue_immediate(
        &self,
        new_jobs: Vec<(String, JobData)>,
    ) -> Result<Vec<String>, VowmailError> {
        let mut jobs = self.jobs.lock().await;
        let now = Utc::now();
        let mut added = Vec::with_capacity(new_jobs.len());

        for (id, data) in new_jobs {
            if jobs.contains_key(&id) {
                debug!(job_id = %id, "Job id collision on enqueue, skipping");
                continue;
            }
            jobs.insert(
                id.clone(),
                QueuedJob {
                    id: id.clone(),
                    data,
                    state: JobState::Waiting,
                    attempts: 0,
                    not_before: now,
                    created_at: now,
                    last_error: None,
                },
            );
            added.push(id);
        }

        info!(count = added.len(), "Enqueued immediate jobs");
        Ok(added)
    }

    async fn schedule_delayed(
        &self,
        job_id: String,
        data: JobData,
        fire_at: DateTime<Utc>,
    ) -> Result<String, VowmailError> {
        let mut jobs = self.jobs.lock().await;
        if jobs.contains_key(&job_id) {
            return Err(VowmailError::Queue(format!(
                "job id already queued: {}",
                job_id
            )));
        }

        let now = Utc::now();
        let not_before = fire_at.max(now);
        jobs.insert(
            job_id.clone(),
            QueuedJob {
                id: job_id.clone(),
                data,
                state: JobState::Waiting,
                attempts: 0,
                not_before,
                created_at: now,
                last_error: None,
            },
        );

        info!(job_id = %job_id, fire_at = %not_before, "Scheduled delayed job");
        Ok(job_id)
    }

    async fn cancel(&self, job_id: &str) -> Result<bool, VowmailError> {
        let mut jobs = self.jobs.lock().await;
        match jobs.get(job_id) {
            None => Ok(false),
            Some(job) if job.state != JobState::Waiting => {
                warn!(job_id = %job_id, state = ?job.state, "Refusing to cancel non-waiting job");
                Ok(false)
            }
            Some(_) => {
                jobs.remove(job_id);
                info!(job_id = %job_id, "Cancelled queued job");
                Ok(true)
            }
        }
    }

    async fn list_pending(&self, wedding_id: &str) -> Result<Vec<PendingJob>, VowmailError> {
        let jobs = self.jobs.lock().await;
        let mut pending: Vec<PendingJob> = jobs
            .values()
            .filter(|j| j.state == JobState::Waiting && j.data.wedding_id() == wedding_id)
            .map(|j| PendingJob {
                job_id: j.id.clone(),
                data: j.data.clone(),
                scheduled_at: j.not_before,
            })
            .collect();
        pending.sort_by_key(|p| p.scheduled_at);
        Ok(pending)
    }

    async fn find(&self, job_id: &str) -> Result<Option<QueuedJob>, VowmailError> {
        let jobs = self.jobs.lock().await;
        Ok(jobs.get(job_id).cloned())
    }

    async fn claim_due(&self, limit: usize) -> Result<Vec<QueuedJob>, VowmailError> {
        let mut jobs = self.jobs.lock().await;
        let now = Utc::now();
        let due_ids: Vec<String> = jobs
            .values()
            .filter(|j| j.state == JobState::Waiting && j.not_before <= now)
            .take(limit)
            .map(|j| j.id.clone())
            .collect();

        let mut claimed = Vec::with_capacity(due_ids.len());
        for id in due_ids {
            if let Some(job) = jobs.get_mut(&id) {
                job.state = JobState::Active;
                claimed.push(job.clone());
            }
        }
        Ok(claimed)
    }

    async fn complete(&self, job_id: &str) -> Result<(), VowmailError> {
        let mut jobs = self.jobs.lock().await;
        jobs.remove(job_id);
        debug!(job_id = %job_id, "Pruned completed job");
        Ok(())
    }

    async fn fail(
        &self,
        job_id: &str,
        reason: &str,
        retriable: bool,
    ) -> Result<(), VowmailError> {
        let mut jobs = self.jobs.lock().await;
        let Some(job) = jobs.get_mut(job_id) else {
            return Err(VowmailError::Queue(format!("unknown job: {}", job_id)));
        };

        job.attempts += 1;
        job.last_error = Some(reason.to_string());

        if retriable && job.attempts < QUEUE_MAX_ATTEMPTS {
            job.state = JobState::Waiting;
            job.not_before = Utc::now() + Self::backoff(job.attempts);
            warn!(
                job_id = %job_id,
                attempt = job.attempts,
                next_attempt_at = %job.not_before,
                "Job failed, will retry with backoff"
            );
        } else {
            job.state = JobState::Failed;
            warn!(job_id = %job_id, attempts = job.attempts, "Job failed permanently");
            Self::evict_excess_failed(&mut jobs);
        }

        Ok(())
    }
}
