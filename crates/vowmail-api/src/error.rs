/// API Error types
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use vowmail_core::VowmailError;

/// API Error
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Convert vowmail-core errors to API errors. Infrastructure failures go out
/// as normalized reason strings, never as raw provider exception text.
impl From<VowmailError> for ApiError {
    fn from(err: VowmailError) -> Self {
        match &err {
            VowmailError::WeddingNotFound(_)
            | VowmailError::GuestNotFound(_)
            | VowmailError::ScheduledEmailNotFound(_) => ApiError::NotFound(err.to_string()),
            VowmailError::NoGuestsSelected
            | VowmailError::InvalidScheduleTime(_)
            | VowmailError::Validation(_) => ApiError::BadRequest(err.to_string()),
            VowmailError::ScheduledEmailAlreadySent(_) => ApiError::Conflict(err.to_string()),
            VowmailError::SignatureInvalid(_) => ApiError::Unauthorized(err.to_string()),
            _ => ApiError::Internal(err.normalized_reason()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_is_normalized() {
        let err = VowmailError::Transport("SES send_raw_email failed: boom".to_string());
        let api_err = ApiError::from(err);
        match api_err {
            ApiError::Internal(msg) => assert_eq!(msg, "email delivery failed"),
            other => panic!("unexpected mapping: {:?}", other),
        }
    }

    #[test]
    fn test_not_found_mapping() {
        let err = VowmailError::WeddingNotFound("w-1".to_string());
        assert!(matches!(ApiError::from(err), ApiError::NotFound(_)));
    }

    #[test]
    fn test_already_sent_is_conflict() {
        let err = VowmailError::ScheduledEmailAlreadySent("s-1".to_string());
        assert!(matches!(ApiError::from(err), ApiError::Conflict(_)));
    }
}
