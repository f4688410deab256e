/// Scheduler / Executor: the control flow tying composer, outbox, queue and
/// transport together for immediate, queued and scheduled batches.
use crate::email::{ComposedEmail, EmailComposer};
use crate::error::VowmailError;
use crate::models::{
    AttemptUpdate, CancelResult, EmailStatus, EmailType, Guest, QueuedReport, ScheduledEmailJob,
    SendOutcome, SendReport, Wedding,
};
use crate::services::directory::{Directory, TokenService};
use crate::services::outbox::OutboxStore;
use crate::services::queue::{DeliveryQueue, JobData, PendingJob};
use crate::services::transport::TransportSender;
use crate::utils::logging::redact_email;
use crate::utils::validation::validate_email_address;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

pub struct EmailPipeline {
    outbox: Arc<dyn OutboxStore>,
    queue: Arc<dyn DeliveryQueue>,
    transport: Arc<dyn TransportSender>,
    directory: Arc<dyn Directory>,
    tokens: Arc<dyn TokenService>,
    composer: EmailComposer,
}

impl EmailPipeline {
    pub fn new(
        outbox: Arc<dyn OutboxStore>,
        queue: Arc<dyn DeliveryQueue>,
        transport: Arc<dyn TransportSender>,
        directory: Arc<dyn Directory>,
        tokens: Arc<dyn TokenService>,
        composer: EmailComposer,
    ) -> Self {
        Self {
            outbox,
            queue,
            transport,
            directory,
            tokens,
            composer,
        }
    }

    /// Sends a batch synchronously, one guest at a time in the order listed.
    /// One guest's failure never aborts the rest; failures come back as rows
    /// in the report, not as errors.
    #[tracing::instrument(name = "pipeline.send_batch", skip(self, guest_ids), fields(wedding_id = %wedding_id, count = guest_ids.len()))]
    pub async fn send_batch(
        &self,
        wedding_id: &str,
        guest_ids: &[String],
        email_type: EmailType,
    ) -> Result<SendReport, VowmailError> {
        let wedding = self.resolve_wedding(wedding_id).await?;
        if guest_ids.is_empty() {
            return Err(VowmailError::NoGuestsSelected);
        }

        let mut report = SendReport::default();
        for guest_id in guest_ids {
            let outcome = self.send_to_guest(guest_id, &wedding, email_type).await;
            report.push(outcome);
        }

        info!(
            wedding_id = wedding_id,
            sent = report.sent,
            failed = report.failed,
            total = report.total,
            email_type = email_type.as_str(),
            "Batch send complete"
        );
        Ok(report)
    }

    /// The per-guest pipeline: regenerate secret, compose, record, send,
    /// mark, stamp. Every fallible step is captured as a result value.
    async fn send_to_guest(
        &self,
        guest_id: &str,
        wedding: &Wedding,
        email_type: EmailType,
    ) -> SendOutcome {
        let prepared = self.prepare_guest_email(guest_id, wedding, email_type).await;
        let (guest, composed) = match prepared {
            Ok(pair) => pair,
            Err(e) => return Self::failure_row(guest_id, "", "", &e),
        };

        let record = match self
            .outbox
            .create(&guest, wedding, &composed.subject, email_type)
            .await
        {
            Ok(record) => record,
            Err(e) => return Self::failure_row(guest_id, &guest.name, &guest.email, &e),
        };

        match self.transport.send(&composed).await {
            Ok(provider_message_id) => {
                let mark = self
                    .outbox
                    .mark_attempt(
                        &record.id,
                        EmailStatus::Sent,
                        AttemptUpdate {
                            provider_message_id: Some(provider_message_id),
                            ..Default::default()
                        },
                    )
                    .await;
                if let Err(e) = mark {
                    warn!(outbox_id = %record.id, error = %e, "Failed to mark record sent");
                }

                if email_type == EmailType::Invitation {
                    if let Err(e) = self.directory.mark_invite_sent(&guest.id).await {
                        warn!(guest_id = %guest.id, error = %e, "Failed to stamp invite-sent");
                    }
                }

                SendOutcome {
                    guest_id: guest.id.clone(),
                    guest_name: guest.name.clone(),
                    email: guest.email.clone(),
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                warn!(
                    guest_id = %guest.id,
                    to = %redact_email(&guest.email),
                    error = %e,
                    "Transport send failed"
                );
                let mark = self
                    .outbox
                    .mark_attempt(
                        &record.id,
                        EmailStatus::Failed,
                        AttemptUpdate {
                            error_message: Some(e.to_string()),
                            ..Default::default()
                        },
                    )
                    .await;
                if let Err(mark_err) = mark {
                    warn!(outbox_id = %record.id, error = %mark_err, "Failed to mark record failed");
                }
                Self::failure_row(&guest.id, &guest.name, &guest.email, &e)
            }
        }
    }

    /// Resolves the guest, validates the address, regenerates the single-use
    /// secret when the email type embeds one, and composes the content.
    async fn prepare_guest_email(
        &self,
        guest_id: &str,
        wedding: &Wedding,
        email_type: EmailType,
    ) -> Result<(Guest, ComposedEmail), VowmailError> {
        let (guest, raw_secret) = if email_type.needs_secret() {
            let (guest, secret) = self.tokens.regenerate_secret(guest_id).await?;
            (guest, Some(secret))
        } else {
            let guest = self
                .directory
                .find_guest(guest_id)
                .await?
                .ok_or_else(|| VowmailError::GuestNotFound(guest_id.to_string()))?;
            (guest, None)
        };

        validate_email_address(&guest.email)?;

        let composed =
            self.composer
                .compose(email_type, &guest, wedding, raw_secret.as_deref())?;
        Ok((guest, composed))
    }

    fn failure_row(guest_id: &str, name: &str, email: &str, error: &VowmailError) -> SendOutcome {
        SendOutcome {
            guest_id: guest_id.to_string(),
            guest_name: name.to_string(),
            email: email.to_string(),
            success: false,
            error: Some(error.normalized_reason()),
        }
    }

    /// Queues a batch for asynchronous delivery: one `pending` outbox record
    /// and one immediate queue job per guest, job id == outbox record id.
    /// Guests whose preparation fails come back as failure rows, same as
    /// `send_batch`. A queue outage marks every affected record failed and
    /// surfaces a single batch-level error.
    pub async fn queue_batch(
        &self,
        wedding_id: &str,
        guest_ids: &[String],
        email_type: EmailType,
    ) -> Result<QueuedReport, VowmailError> {
        let wedding = self.resolve_wedding(wedding_id).await?;
        if guest_ids.is_empty() {
            return Err(VowmailError::NoGuestsSelected);
        }

        let mut jobs = Vec::new();
        let mut failures = Vec::new();
        for guest_id in guest_ids {
            let (guest, composed) =
                match self.prepare_guest_email(guest_id, &wedding, email_type).await {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(guest_id = %guest_id, error = %e, "Guest failed queued-batch preparation");
                        failures.push(Self::failure_row(guest_id, "", "", &e));
                        continue;
                    }
                };

            let record = self
                .outbox
                .create(&guest, &wedding, &composed.subject, email_type)
                .await?;

            jobs.push((
                record.id.clone(),
                JobData::SendEmail {
                    outbox_id: record.id,
                    wedding_id: wedding.id.clone(),
                    email: composed,
                },
            ));
        }

        let outbox_ids: Vec<String> = jobs.iter().map(|(id, _)| id.clone()).collect();
        let total = guest_ids.len() as u64;

        match self.queue.enqueue_immediate(jobs).await {
            Ok(job_ids) => Ok(QueuedReport {
                queued: job_ids.len() as u64,
                failed: failures.len() as u64,
                total,
                job_ids,
                failures,
            }),
            Err(e) => {
                // Queue outage: every affected record is failed with the
                // outage reason so the audit trail reflects reality.
                for outbox_id in &outbox_ids {
                    let mark = self
                        .outbox
                        .mark_attempt(
                            outbox_id,
                            EmailStatus::Failed,
                            AttemptUpdate {
                                error_message: Some(e.to_string()),
                                ..Default::default()
                            },
                        )
                        .await;
                    if let Err(mark_err) = mark {
                        warn!(outbox_id = %outbox_id, error = %mark_err, "Failed to mark record after queue outage");
                    }
                }
                Err(VowmailError::ReminderQueueFailed(e.to_string()))
            }
        }
    }

    /// Schedules a batch for a future instant. Validation failures are
    /// rejected before any side effect.
    pub async fn schedule_email(
        &self,
        wedding_id: &str,
        guest_ids: Vec<String>,
        email_type: EmailType,
        send_at: DateTime<Utc>,
    ) -> Result<ScheduledEmailJob, VowmailError> {
        self.resolve_wedding(wedding_id).await?;
        if guest_ids.is_empty() {
            return Err(VowmailError::NoGuestsSelected);
        }
        if send_at <= Utc::now() {
            return Err(VowmailError::InvalidScheduleTime(format!(
                "{} is not in the future",
                send_at.to_rfc3339()
            )));
        }

        let job = ScheduledEmailJob::new(wedding_id, guest_ids, email_type, send_at);
        self.queue
            .schedule_delayed(
                job.id.clone(),
                JobData::ScheduledBatch {
                    scheduled: job.clone(),
                },
                send_at,
            )
            .await?;

        info!(
            scheduled_email_id = %job.id,
            wedding_id = wedding_id,
            send_at = %send_at,
            email_type = email_type.as_str(),
            "Scheduled email batch"
        );
        Ok(job)
    }

    /// Executes a scheduled batch at fire time. Wedding and guests are
    /// re-resolved at current state, deliberately not frozen at scheduling
    /// time; a missing wedding fails the whole batch fast.
    pub async fn execute_scheduled_email(
        &self,
        scheduled: &ScheduledEmailJob,
    ) -> Result<SendReport, VowmailError> {
        info!(
            scheduled_email_id = %scheduled.id,
            wedding_id = %scheduled.wedding_id,
            "Executing scheduled email batch"
        );
        self.send_batch(
            &scheduled.wedding_id,
            &scheduled.guest_ids,
            scheduled.email_type,
        )
        .await
    }

    /// Cancels a scheduled batch that has not been claimed by a worker.
    /// Active and exhausted jobs refuse cancellation; pruned (completed) or
    /// unknown ids report not-found.
    pub async fn cancel_scheduled_email(
        &self,
        scheduled_email_id: &str,
    ) -> Result<CancelResult, VowmailError> {
        let job = self
            .queue
            .find(scheduled_email_id)
            .await?
            .ok_or_else(|| {
                VowmailError::ScheduledEmailNotFound(scheduled_email_id.to_string())
            })?;

        let JobData::ScheduledBatch { scheduled } = job.data else {
            return Err(VowmailError::ScheduledEmailNotFound(
                scheduled_email_id.to_string(),
            ));
        };

        if self.queue.cancel(scheduled_email_id).await? {
            Ok(CancelResult {
                success: true,
                scheduled_email: scheduled,
            })
        } else {
            Err(VowmailError::ScheduledEmailAlreadySent(
                scheduled_email_id.to_string(),
            ))
        }
    }

    /// Scheduled batches still waiting to fire for a wedding.
    pub async fn list_scheduled(
        &self,
        wedding_id: &str,
    ) -> Result<Vec<ScheduledEmailJob>, VowmailError> {
        let pending = self.queue.list_pending(wedding_id).await?;
        Ok(pending
            .into_iter()
            .filter_map(|PendingJob { data, .. }| match data {
                JobData::ScheduledBatch { scheduled } => Some(scheduled),
                JobData::SendEmail { .. } => None,
            })
            .collect())
    }

    async fn resolve_wedding(&self, wedding_id: &str) -> Result<Wedding, VowmailError> {
        self.directory
            .find_wedding(wedding_id)
            .await?
            .ok_or_else(|| VowmailError::WeddingNotFound(wedding_id.to_string()))
    }
}
