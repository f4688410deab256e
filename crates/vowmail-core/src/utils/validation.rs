/// Recipient address validation
use crate::constants::{EMAIL_REGEX_PATTERN, MAX_EMAIL_ADDRESS_LENGTH};
use crate::error::VowmailError;
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_REGEX_PATTERN).expect("valid email regex"));

/// Validates an email address against a simplified RFC 5322 pattern.
pub fn validate_email_address(address: &str) -> Result<(), VowmailError> {
    if address.is_empty() {
        return Err(VowmailError::Validation(
            "email address is empty".to_string(),
        ));
    }

    if address.len() > MAX_EMAIL_ADDRESS_LENGTH {
        return Err(VowmailError::Validation(format!(
            "email address exceeds {} characters",
            MAX_EMAIL_ADDRESS_LENGTH
        )));
    }

    if !EMAIL_REGEX.is_match(address) {
        return Err(VowmailError::Validation(format!(
            "invalid email address: {}",
            crate::utils::logging::redact_email(address)
        )));
    }

    Ok(())
}
