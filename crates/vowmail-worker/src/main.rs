use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vowmail_core::email::EmailComposer;
use vowmail_core::services::directory::InMemoryDirectory;
use vowmail_core::services::outbox::{InMemoryOutboxStore, OutboxStore};
use vowmail_core::services::queue::{DeliveryQueue, InMemoryDeliveryQueue};
use vowmail_core::services::scheduler::EmailPipeline;
use vowmail_core::services::transport::{SesTransportSender, TransportSender};
use vowmail_worker::Dispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = vowmail_core::VERSION, "Starting vowmail worker");

    let queue: Arc<dyn DeliveryQueue> = Arc::new(InMemoryDeliveryQueue::new());
    let outbox: Arc<dyn OutboxStore> = Arc::new(InMemoryOutboxStore::new());
    let transport: Arc<dyn TransportSender> = Arc::new(SesTransportSender::from_env().await?);
    let directory = Arc::new(InMemoryDirectory::new());

    let pipeline = Arc::new(EmailPipeline::new(
        outbox.clone(),
        queue.clone(),
        transport.clone(),
        directory.clone(),
        directory,
        EmailComposer::from_env()?,
    ));

    let dispatcher = Dispatcher::new(queue, outbox, transport, pipeline);
    dispatcher
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await;

    info!("Worker stopped");
    Ok(())
}
