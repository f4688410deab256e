/// API Context - shared state for all API handlers
use std::sync::Arc;
use vowmail_core::email::EmailComposer;
use vowmail_core::error::VowmailError;
use vowmail_core::services::directory::InMemoryDirectory;
use vowmail_core::services::outbox::{InMemoryOutboxStore, OutboxStore};
use vowmail_core::services::queue::{DeliveryQueue, InMemoryDeliveryQueue};
use vowmail_core::services::scheduler::EmailPipeline;
use vowmail_core::services::transport::{SesTransportSender, TransportSender};

/// Shared resources for API handlers
#[derive(Clone)]
pub struct ApiContext {
    /// Send/schedule/cancel pipeline
    pub pipeline: Arc<EmailPipeline>,

    /// Outbox store, used directly by the webhook and listing endpoints
    pub outbox: Arc<dyn OutboxStore>,

    /// Shared secret for webhook signature verification. When unset, inbound
    /// webhooks are accepted without a signature check.
    pub webhook_secret: Option<String>,
}

impl ApiContext {
    pub fn new(
        pipeline: Arc<EmailPipeline>,
        outbox: Arc<dyn OutboxStore>,
        webhook_secret: Option<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            pipeline,
            outbox,
            webhook_secret,
        })
    }

    /// Builds a context from the environment: SES transport, in-memory
    /// queue/outbox/directory backends, and the optional webhook secret from
    /// `WEBHOOK_SECRET`.
    pub async fn from_env() -> Result<Arc<Self>, VowmailError> {
        let queue: Arc<dyn DeliveryQueue> = Arc::new(InMemoryDeliveryQueue::new());
        let outbox: Arc<dyn OutboxStore> = Arc::new(InMemoryOutboxStore::new());
        let transport: Arc<dyn TransportSender> =
            Arc::new(SesTransportSender::from_env().await?);
        let directory = Arc::new(InMemoryDirectory::new());

        let pipeline = Arc::new(EmailPipeline::new(
            outbox.clone(),
            queue,
            transport,
            directory.clone(),
            directory,
            EmailComposer::from_env()?,
        ));

        Ok(Self::new(pipeline, outbox, std::env::var("WEBHOOK_SECRET").ok()))
    }
}
