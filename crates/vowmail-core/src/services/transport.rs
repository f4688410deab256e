/// Transport sender: wraps the outbound email-provider API
use crate::constants::TRANSPORT_TIMEOUT_SECS;
use crate::email::ComposedEmail;
use crate::error::VowmailError;
use crate::utils::logging::{redact_email, redact_subject};
use crate::utils::retry::{RetryConfig, retry_with_backoff};
use async_trait::async_trait;
use lettre::message::{Mailbox, Message, MultiPart, SinglePart};
use std::str::FromStr;
use std::time::Duration;

/// Sends one rendered email and returns the provider message id, later used
/// as the webhook reconciliation key.
#[async_trait]
pub trait TransportSender: Send + Sync {
    async fn send(&self, email: &ComposedEmail) -> Result<String, VowmailError>;
}

/// SES-backed transport. Every call is bounded by a timeout; an exceeded
/// timeout is an ordinary transport failure, eligible for the queue's retry
/// policy.
pub struct SesTransportSender {
    client: aws_sdk_ses::Client,
    from_address: String,
    from_name: String,
    timeout: Duration,
}

impl SesTransportSender {
    pub fn new(
        client: aws_sdk_ses::Client,
        from_address: impl Into<String>,
        from_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            from_address: from_address.into(),
            from_name: from_name.into(),
            timeout: Duration::from_secs(TRANSPORT_TIMEOUT_SECS),
        }
    }

    pub async fn from_env() -> Result<Self, VowmailError> {
        let from_address = std::env::var("MAIL_FROM_ADDRESS")
            .map_err(|_| VowmailError::Config("Missing MAIL_FROM_ADDRESS".to_string()))?;
        let from_name =
            std::env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "Vowmail".to_string());

        let aws_config = aws_config::load_from_env().await;
        let client = aws_sdk_ses::Client::new(&aws_config);
        Ok(Self::new(client, from_address, from_name))
    }

    /// Assembles the raw MIME message: multipart/alternative with plain text
    /// and HTML parts.
    fn build_mime(&self, email: &ComposedEmail) -> Result<Vec<u8>, VowmailError> {
        let from = Mailbox::new(
            Some(self.from_name.clone()),
            self.from_address
                .parse()
                .map_err(|e| VowmailError::Config(format!("Invalid from address: {}", e)))?,
        );

        let to = if email.to_name.is_empty() {
            Mailbox::from_str(&email.to)
                .map_err(|e| VowmailError::Validation(format!("Invalid recipient: {}", e)))?
        } else {
            Mailbox::new(
                Some(email.to_name.clone()),
                email
                    .to
                    .parse()
                    .map_err(|e| VowmailError::Validation(format!("Invalid recipient: {}", e)))?,
            )
        };

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(&email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(SinglePart::plain(email.text_body.clone()))
                    .singlepart(SinglePart::html(email.html_body.clone())),
            )
            .map_err(|e| {
                VowmailError::Validation(format!("Failed to build MIME message: {}", e))
            })?;

        Ok(message.formatted())
    }
}

#[async_trait]
impl TransportSender for SesTransportSender {
    async fn send(&self, email: &ComposedEmail) -> Result<String, VowmailError> {
        use aws_sdk_ses::primitives::Blob;

        let raw_email = self.build_mime(email)?;

        // Build message once (outside retry loop)
        let raw_message = aws_sdk_ses::types::RawMessage::builder()
            .data(Blob::new(raw_email))
            .build()
            .map_err(|e| VowmailError::Transport(format!("Failed to build raw message: {}", e)))?;

        let response = tokio::time::timeout(
            self.timeout,
            retry_with_backoff(
                || {
                    let client = self.client.clone();
                    let message = raw_message.clone();
                    let from = self.from_address.clone();
                    let to = email.to.clone();

                    async move {
                        client
                            .send_raw_email()
                            .raw_message(message)
                            .source(from)
                            .destinations(to)
                            .send()
                            .await
                            .map_err(|e| {
                                VowmailError::Transport(format!(
                                    "SES send_raw_email failed: {}",
                                    e
                                ))
                            })
                    }
                },
                RetryConfig::default(),
                "ses_send_raw_email",
            ),
        )
        .await
        .map_err(|_| {
            VowmailError::Transport(format!(
                "transport call exceeded {}s timeout",
                self.timeout.as_secs()
            ))
        })??;

        let message_id = response.message_id;

        tracing::info!(
            provider_message_id = %message_id,
            to = %redact_email(&email.to),
            subject = %redact_subject(&email.subject),
            "Sent email via SES"
        );
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_client() -> aws_sdk_ses::Client {
        let config = aws_config::load_from_env().await;
        aws_sdk_ses::Client::new(&config)
    }

    #[tokio::test]
    async fn test_build_mime_multipart() {
        let sender = SesTransportSender::new(
            test_client().await,
            "invites@weddings.example.com",
            "Ana & Ben",
        );

        let email = ComposedEmail {
            to: "clara@example.com".to_string(),
            to_name: "Clara".to_string(),
            subject: "You're invited".to_string(),
            html_body: "<p>Join us</p>".to_string(),
            text_body: "Join us".to_string(),
        };

        let raw = sender.build_mime(&email).unwrap();
        let raw_str = String::from_utf8_lossy(&raw);

        assert!(raw_str.contains("multipart/alternative"));
        assert!(raw_str.contains("To: Clara <clara@example.com>"));
        assert!(raw_str.contains("Subject: You're invited"));
        assert!(raw_str.contains("<p>Join us</p>"));
    }

    #[tokio::test]
    async fn test_build_mime_invalid_recipient() {
        let sender = SesTransportSender::new(
            test_client().await,
            "invites@weddings.example.com",
            "Ana & Ben",
        );

        let email = ComposedEmail {
            to: "not an address".to_string(),
            to_name: String::new(),
            subject: "s".to_string(),
            html_body: String::new(),
            text_body: String::new(),
        };

        assert!(sender.build_mime(&email).is_err());
    }
}
