/// Outbox record model and delivery status state machine
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kinds of guest email the pipeline can send
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EmailType {
    Invitation,
    Reminder,
    SaveTheDate,
    ThankYou,
    Update,
}

impl EmailType {
    /// Invitation and reminder emails embed a freshly regenerated single-use
    /// RSVP secret in their link; the other types carry no secret.
    pub fn needs_secret(&self) -> bool {
        matches!(self, Self::Invitation | Self::Reminder)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invitation => "invitation",
            Self::Reminder => "reminder",
            Self::SaveTheDate => "save_the_date",
            Self::ThankYou => "thank_you",
            Self::Update => "update",
        }
    }
}

/// Delivery status of one send attempt.
///
/// Transitions are monotonic in the forward direction:
/// `pending -> {sent, failed}`, `sent -> {delivered, bounced}`.
/// `delivered`, `bounced` and `failed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    Pending,
    Sent,
    Failed,
    Delivered,
    Bounced,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Delivered => "delivered",
            Self::Bounced => "bounced",
        }
    }

    /// Provider-confirmed terminal outcomes; never overwritten by a later
    /// `sent` update from the worker.
    pub fn is_terminal_delivery(&self) -> bool {
        matches!(self, Self::Delivered | Self::Bounced)
    }

    /// Whether moving from `self` to `to` is a forward transition.
    /// Re-marking the same status is allowed (idempotent writers).
    pub fn can_transition(&self, to: EmailStatus) -> bool {
        use EmailStatus::*;
        if *self == to {
            return true;
        }
        match (*self, to) {
            (Pending, Sent) | (Pending, Failed) => true,
            (Sent, Delivered) | (Sent, Bounced) => true,
            // A provider callback may outrun the worker's own `sent` write.
            (Pending, Delivered) | (Pending, Bounced) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BounceType {
    Hard,
    Soft,
}

/// One row per send attempt. Records are never deleted; a successful retry of
/// a failed send is a new record, never a mutation of history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailOutboxRecord {
    /// Opaque id, also used as the queue job id so at most one job is ever
    /// in flight per attempt.
    pub id: String,
    pub wedding_id: String,
    pub guest_id: String,
    pub email_type: EmailType,
    pub recipient_email: String,
    pub recipient_name: String,
    pub subject: String,
    pub status: EmailStatus,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounced_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounce_type: Option<BounceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounce_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Reconciliation key, set once the transport succeeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_message_id: Option<String>,
}

impl EmailOutboxRecord {
    pub fn new(
        guest_id: impl Into<String>,
        wedding_id: impl Into<String>,
        recipient_email: impl Into<String>,
        recipient_name: impl Into<String>,
        subject: impl Into<String>,
        email_type: EmailType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            wedding_id: wedding_id.into(),
            guest_id: guest_id.into(),
            email_type,
            recipient_email: recipient_email.into(),
            recipient_name: recipient_name.into(),
            subject: subject.into(),
            status: EmailStatus::Pending,
            attempts: 0,
            created_at: now,
            updated_at: now,
            sent_at: None,
            delivered_at: None,
            bounced_at: None,
            bounce_type: None,
            bounce_reason: None,
            last_error: None,
            provider_message_id: None,
        }
    }
}

/// Optional fields accompanying a status update from the worker
#[derive(Debug, Clone, Default)]
pub struct AttemptUpdate {
    pub error_message: Option<String>,
    pub provider_message_id: Option<String>,
    pub bounce_type: Option<BounceType>,
    pub bounce_reason: Option<String>,
}

/// Per-wedding delivery statistics for the admin dashboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeliveryStats {
    pub total: u64,
    pub by_status: HashMap<String, u64>,
    pub by_type: HashMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        use EmailStatus::*;
        assert!(Pending.can_transition(Sent));
        assert!(Pending.can_transition(Failed));
        assert!(Sent.can_transition(Delivered));
        assert!(Sent.can_transition(Bounced));
        assert!(Pending.can_transition(Delivered));
    }

    #[test]
    fn test_no_backward_transitions() {
        use EmailStatus::*;
        assert!(!Delivered.can_transition(Sent));
        assert!(!Delivered.can_transition(Pending));
        assert!(!Bounced.can_transition(Sent));
        assert!(!Bounced.can_transition(Delivered));
        assert!(!Failed.can_transition(Sent));
        assert!(!Sent.can_transition(Pending));
    }

    #[test]
    fn test_same_status_is_idempotent() {
        use EmailStatus::*;
        assert!(Delivered.can_transition(Delivered));
        assert!(Bounced.can_transition(Bounced));
        assert!(Pending.can_transition(Pending));
    }

    #[test]
    fn test_email_type_secret_requirement() {
        assert!(EmailType::Invitation.needs_secret());
        assert!(EmailType::Reminder.needs_secret());
        assert!(!EmailType::SaveTheDate.needs_secret());
        assert!(!EmailType::ThankYou.needs_secret());
        assert!(!EmailType::Update.needs_secret());
    }

    #[test]
    fn test_email_type_serialization() {
        assert_eq!(
            serde_json::to_string(&EmailType::SaveTheDate).unwrap(),
            "\"save_the_date\""
        );
        assert_eq!(
            serde_json::to_string(&EmailStatus::Delivered).unwrap(),
            "\"delivered\""
        );
    }
}
