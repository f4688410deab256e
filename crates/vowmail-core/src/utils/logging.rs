/// Logging utilities for PII redaction
///
/// Guest addresses and subject lines are personal data; anything that lands
/// in logs goes through these helpers first.
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").unwrap());

/// Redacts email addresses from text, preserving domain for debugging
///
/// # Examples
/// ```
/// use vowmail_core::utils::logging::redact_email;
///
/// assert_eq!(redact_email("guest@example.com"), "***@example.com");
/// ```
pub fn redact_email(text: &str) -> String {
    EMAIL_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            let email = &caps[0];
            if let Some(at_pos) = email.find('@') {
                format!("***{}", &email[at_pos..])
            } else {
                "***@***".to_string()
            }
        })
        .to_string()
}

/// Redacts subject line for logging (truncates and masks). Counts characters,
/// not bytes, so subjects starting with accented names truncate cleanly.
pub fn redact_subject(subject: &str) -> String {
    const MAX_VISIBLE_CHARS: usize = 3;
    const MIN_CHARS_TO_REDACT: usize = 6;

    let total = subject.chars().count();
    if total < MIN_CHARS_TO_REDACT {
        subject.to_string()
    } else {
        let prefix: String = subject.chars().take(MAX_VISIBLE_CHARS).collect();
        format!("{}...[{} chars]", prefix, total)
    }
}
