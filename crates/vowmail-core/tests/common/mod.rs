/// Shared fixtures for the integration suites.
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use vowmail_core::email::{ComposedEmail, EmailComposer};
use vowmail_core::error::VowmailError;
use vowmail_core::models::{Guest, Wedding};
use vowmail_core::services::directory::InMemoryDirectory;
use vowmail_core::services::outbox::{InMemoryOutboxStore, OutboxStore};
use vowmail_core::services::queue::{DeliveryQueue, InMemoryDeliveryQueue};
use vowmail_core::services::scheduler::EmailPipeline;
use vowmail_core::services::transport::TransportSender;

/// Transport double that records sends and can be told to fail specific
/// recipients.
pub struct MockTransport {
    calls: AtomicU32,
    pub fail_recipients: Vec<String>,
}

impl MockTransport {
    pub fn succeeding() -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail_recipients: Vec::new(),
        }
    }

    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail_recipients: recipients.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn sends(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransportSender for MockTransport {
    async fn send(&self, email: &ComposedEmail) -> Result<String, VowmailError> {
        if self.fail_recipients.contains(&email.to) {
            return Err(VowmailError::Transport("451 connection refused".to_string()));
        }
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("prov-{}", call))
    }
}

pub struct TestPipeline {
    pub pipeline: EmailPipeline,
    pub outbox: Arc<dyn OutboxStore>,
    pub queue: Arc<dyn DeliveryQueue>,
    pub directory: Arc<InMemoryDirectory>,
    pub transport: Arc<MockTransport>,
}

pub fn pipeline_with(transport: MockTransport) -> TestPipeline {
    let outbox: Arc<dyn OutboxStore> = Arc::new(InMemoryOutboxStore::new());
    let queue: Arc<dyn DeliveryQueue> = Arc::new(InMemoryDeliveryQueue::new());
    let directory = Arc::new(InMemoryDirectory::new());
    let transport = Arc::new(transport);

    let pipeline = EmailPipeline::new(
        outbox.clone(),
        queue.clone(),
        transport.clone(),
        directory.clone(),
        directory.clone(),
        EmailComposer::new("https://vowmail.example.com"),
    );

    TestPipeline {
        pipeline,
        outbox,
        queue,
        directory,
        transport,
    }
}

pub fn wedding() -> Wedding {
    Wedding {
        id: "w-1".to_string(),
        slug: "ana-and-ben".to_string(),
        partner_one: "Ana".to_string(),
        partner_two: "Ben".to_string(),
        event_date: NaiveDate::from_ymd_opt(2026, 6, 14).unwrap(),
        venue: "Rosewood Hall".to_string(),
        city: "Lisbon".to_string(),
        theme: Default::default(),
        templates: Default::default(),
    }
}

pub fn guest(id: &str, name: &str, email: &str) -> Guest {
    Guest {
        id: id.to_string(),
        wedding_id: "w-1".to_string(),
        name: name.to_string(),
        email: email.to_string(),
        rsvp_status: None,
        invite_sent_at: None,
    }
}

/// One wedding with three guests; the second carries an invalid address.
pub async fn seed_three_guests(t: &TestPipeline) {
    t.directory.insert_wedding(wedding()).await;
    t.directory
        .insert_guest(guest("g-1", "Clara", "clara@example.com"))
        .await;
    t.directory
        .insert_guest(guest("g-2", "Broken", "not-an-address"))
        .await;
    t.directory
        .insert_guest(guest("g-3", "Deniz", "deniz@example.com"))
        .await;
}
