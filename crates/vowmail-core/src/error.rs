/// Error types for the Vowmail pipeline
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VowmailError {
    #[error("wedding not found: {0}")]
    WeddingNotFound(String),

    #[error("guest not found: {0}")]
    GuestNotFound(String),

    #[error("no guests selected")]
    NoGuestsSelected,

    #[error("invalid schedule time: {0}")]
    InvalidScheduleTime(String),

    #[error("scheduled email not found: {0}")]
    ScheduledEmailNotFound(String),

    #[error("scheduled email already sent: {0}")]
    ScheduledEmailAlreadySent(String),

    #[error("reminder queue failed: {0}")]
    ReminderQueueFailed(String),

    #[error("webhook signature invalid: {0}")]
    SignatureInvalid(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("queue error: {0}")]
    Queue(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),
}

impl VowmailError {
    /// Determines if an error is retriable
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Transport(_) => true, // Provider throttling and timeouts are transient
            Self::Queue(_) => true,
            Self::Storage(_) => true,
            Self::WeddingNotFound(_) => false,
            Self::GuestNotFound(_) => false,
            Self::NoGuestsSelected => false,
            Self::InvalidScheduleTime(_) => false,
            Self::ScheduledEmailNotFound(_) => false,
            Self::ScheduledEmailAlreadySent(_) => false,
            Self::ReminderQueueFailed(_) => false,
            Self::SignatureInvalid(_) => false,
            Self::Config(_) => false,
            Self::Validation(_) => false,
        }
    }

    /// Normalized reason string for per-recipient result rows.
    ///
    /// Admins never see raw provider exception text; the full message still
    /// lands in the outbox record's `last_error` for operators.
    pub fn normalized_reason(&self) -> String {
        match self {
            Self::Transport(_) => "email delivery failed".to_string(),
            Self::Queue(_) | Self::ReminderQueueFailed(_) => {
                "delivery queue unavailable".to_string()
            }
            Self::Storage(_) => "internal storage error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for VowmailError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<std::env::VarError> for VowmailError {
    fn from(err: std::env::VarError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_errors() {
        assert!(VowmailError::Transport("test".to_string()).is_retriable());
        assert!(VowmailError::Queue("test".to_string()).is_retriable());
        assert!(!VowmailError::Validation("test".to_string()).is_retriable());
        assert!(!VowmailError::InvalidScheduleTime("past".to_string()).is_retriable());
    }

    #[test]
    fn test_error_display() {
        let err = VowmailError::WeddingNotFound("w-1".to_string());
        assert_eq!(err.to_string(), "wedding not found: w-1");
    }

    #[test]
    fn test_normalized_reason_hides_provider_text() {
        let err = VowmailError::Transport("SES send_raw_email failed: 454 throttled".to_string());
        assert_eq!(err.normalized_reason(), "email delivery failed");
        assert!(!err.normalized_reason().contains("454"));
    }
}
