/// Guest and wedding records, consumed as read-only collaborator inputs
use super::outbox::EmailType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A wedding guest. Read-only to the pipeline except for the invite-sent
/// timestamp stamped back through the directory on a successful send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guest {
    pub id: String,
    pub wedding_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub rsvp_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_sent_at: Option<DateTime<Utc>>,
}

/// Theme colors applied to the HTML body wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeddingTheme {
    pub primary_color: String,
    pub accent_color: String,
}

impl Default for WeddingTheme {
    fn default() -> Self {
        Self {
            primary_color: "#7c5c8a".to_string(),
            accent_color: "#d4af7a".to_string(),
        }
    }
}

/// Per-wedding template override for one email type. Any field left `None`
/// falls back to the documented default wording.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EmailTemplateOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wedding {
    pub id: String,
    pub slug: String,
    pub partner_one: String,
    pub partner_two: String,
    pub event_date: NaiveDate,
    pub venue: String,
    pub city: String,
    #[serde(default)]
    pub theme: WeddingTheme,
    /// Optional custom email templates keyed by email type
    #[serde(default)]
    pub templates: HashMap<EmailType, EmailTemplateOverride>,
}

impl Wedding {
    /// Combined partner names, as rendered in templates
    pub fn partner_names(&self) -> String {
        format!("{} & {}", self.partner_one, self.partner_two)
    }

    /// Human-readable event date, e.g. "June 14, 2026"
    pub fn formatted_date(&self) -> String {
        self.event_date.format("%B %-d, %Y").to_string()
    }
}
