/// Queue dispatcher: claims due jobs and drives them to a terminal outcome.
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use vowmail_core::constants::{QUEUE_MAX_ATTEMPTS, WORKER_CLAIM_BATCH, WORKER_POLL_INTERVAL_MS};
use vowmail_core::error::VowmailError;
use vowmail_core::models::{AttemptUpdate, EmailStatus};
use vowmail_core::services::outbox::OutboxStore;
use vowmail_core::services::queue::{DeliveryQueue, JobData, QueuedJob};
use vowmail_core::services::scheduler::EmailPipeline;
use vowmail_core::services::transport::TransportSender;

pub struct Dispatcher {
    queue: Arc<dyn DeliveryQueue>,
    outbox: Arc<dyn OutboxStore>,
    transport: Arc<dyn TransportSender>,
    pipeline: Arc<EmailPipeline>,
}

impl Dispatcher {
    pub fn new(
        queue: Arc<dyn DeliveryQueue>,
        outbox: Arc<dyn OutboxStore>,
        transport: Arc<dyn TransportSender>,
        pipeline: Arc<EmailPipeline>,
    ) -> Self {
        Self {
            queue,
            outbox,
            transport,
            pipeline,
        }
    }

    /// Polls until the shutdown future resolves. Jobs already claimed when
    /// shutdown fires are finished before returning; unclaimed jobs stay
    /// `waiting` and survive for the next run.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        info!("Dispatcher started");
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Dispatcher shutting down");
                    return;
                }
                _ = tokio::time::sleep(Duration::from_millis(WORKER_POLL_INTERVAL_MS)) => {
                    if let Err(e) = self.run_once().await {
                        error!(error = %e, "Dispatch cycle failed");
                    }
                }
            }
        }
    }

    /// One dispatch cycle: claim a batch of due jobs and execute each to
    /// completion. Returns the number of jobs claimed.
    pub async fn run_once(&self) -> Result<usize, VowmailError> {
        let claimed = self.queue.claim_due(WORKER_CLAIM_BATCH).await?;
        let count = claimed.len();
        for job in claimed {
            self.execute_job(job).await;
        }
        Ok(count)
    }

    /// Executes one claimed job. The job's own failure handling never
    /// propagates; every path ends in `complete` or `fail` so the claim is
    /// always released.
    async fn execute_job(&self, job: QueuedJob) {
        let job_id = job.id.clone();
        let attempt = job.attempts + 1;

        let result = match &job.data {
            JobData::SendEmail { outbox_id, email, .. } => {
                self.deliver_email(&job, outbox_id, email).await
            }
            JobData::ScheduledBatch { scheduled } => self
                .pipeline
                .execute_scheduled_email(scheduled)
                .await
                .map(|report| {
                    info!(
                        scheduled_email_id = %scheduled.id,
                        sent = report.sent,
                        failed = report.failed,
                        "Scheduled batch executed"
                    );
                }),
        };

        match result {
            Ok(()) => {
                if let Err(e) = self.queue.complete(&job_id).await {
                    error!(job_id = %job_id, error = %e, "Failed to complete job");
                }
            }
            Err(e) => {
                let retriable = e.is_retriable();
                warn!(
                    job_id = %job_id,
                    attempt,
                    retriable,
                    error = %e,
                    "Job execution failed"
                );
                if let Err(fail_err) =
                    self.queue.fail(&job_id, &e.to_string(), retriable).await
                {
                    error!(job_id = %job_id, error = %fail_err, "Failed to record job failure");
                }
            }
        }
    }

    /// Sends one pre-rendered email and writes the outcome to the outbox.
    /// On a retriable failure with attempts remaining, the record stays
    /// `pending` with the error noted; once retries are spent (or the
    /// failure is permanent) it goes `failed`.
    async fn deliver_email(
        &self,
        job: &QueuedJob,
        outbox_id: &str,
        email: &vowmail_core::email::ComposedEmail,
    ) -> Result<(), VowmailError> {
        match self.transport.send(email).await {
            Ok(provider_message_id) => {
                self.outbox
                    .mark_attempt(
                        outbox_id,
                        EmailStatus::Sent,
                        AttemptUpdate {
                            provider_message_id: Some(provider_message_id),
                            ..Default::default()
                        },
                    )
                    .await?;
                Ok(())
            }
            Err(e) => {
                let will_retry = e.is_retriable() && job.attempts + 1 < QUEUE_MAX_ATTEMPTS;
                let status = if will_retry {
                    EmailStatus::Pending
                } else {
                    EmailStatus::Failed
                };
                if let Err(mark_err) = self
                    .outbox
                    .mark_attempt(
                        outbox_id,
                        status,
                        AttemptUpdate {
                            error_message: Some(e.to_string()),
                            ..Default::default()
                        },
                    )
                    .await
                {
                    error!(
                        outbox_id = %outbox_id,
                        error = %mark_err,
                        "Failed to record attempt outcome"
                    );
                }
                Err(e)
            }
        }
    }
}
