/// Delivery-provider webhook event types (read-only input)
use serde::{Deserialize, Serialize};

/// One provider delivery callback. Providers retry webhooks, batch multiple
/// events per POST, and may emit several events for the same message id
/// (e.g. `processed` then `delivered`).
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEvent {
    /// Event type: delivered, bounce, dropped, deferred, spamreport, ...
    pub event: String,
    /// Provider message id; may carry a `.`-delimited per-recipient suffix
    #[serde(default, alias = "sg_message_id")]
    pub provider_message_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Bounce classification: `hard` or `soft` (bounce events only)
    #[serde(default, rename = "type")]
    pub bounce_class: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl ProviderEvent {
    /// Human-readable failure reason, preferring `reason` over `response`
    pub fn failure_reason(&self) -> String {
        self.reason
            .clone()
            .or_else(|| self.response.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Per-batch ingestion outcome returned to the provider
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct WebhookSummary {
    pub processed: u64,
    pub errors: u64,
}
