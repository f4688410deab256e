/// Data models for the guest email pipeline
pub mod guest;
pub mod outbox;
pub mod report;
pub mod schedule;
pub mod webhook;

pub use guest::{EmailTemplateOverride, Guest, Wedding, WeddingTheme};
pub use outbox::{AttemptUpdate, BounceType, DeliveryStats, EmailOutboxRecord, EmailStatus, EmailType};
pub use report::{CancelResult, QueuedReport, SendOutcome, SendReport};
pub use schedule::ScheduledEmailJob;
pub use webhook::{ProviderEvent, WebhookSummary};
