/// Webhook signature verification.
///
/// The provider signs `timestamp + raw_payload` with HMAC-SHA256 and sends
/// the lowercase hex digest in a header. Verification runs over the raw
/// request bytes before any JSON parsing, and the comparison is
/// constant-time.
use hmac::{Hmac, Mac};
use sha2::Sha256;
use vowmail_core::error::VowmailError;

type HmacSha256 = Hmac<Sha256>;

/// Verifies an inbound webhook signature. A mismatch rejects the whole
/// batch; the caller must not process any event first.
pub fn verify_webhook_signature(
    secret: &str,
    timestamp: &str,
    payload: &[u8],
    signature: &str,
) -> Result<(), VowmailError> {
    if signature.is_empty() {
        return Err(VowmailError::SignatureInvalid(
            "signature header is empty".to_string(),
        ));
    }

    // Tolerate the common "sha256=<hex>" prefix
    let hex_signature = signature.strip_prefix("sha256=").unwrap_or(signature);

    let expected = compute_signature(secret, timestamp, payload)?;
    if timing_safe_eq(hex_signature, &expected) {
        Ok(())
    } else {
        Err(VowmailError::SignatureInvalid(
            "signature mismatch".to_string(),
        ))
    }
}

/// HMAC-SHA256 over `timestamp + payload`, hex-encoded.
pub fn compute_signature(
    secret: &str,
    timestamp: &str,
    payload: &[u8],
) -> Result<String, VowmailError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| VowmailError::Config("invalid webhook secret".to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison so timing never leaks the expected digest.
fn timing_safe_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (a_byte, b_byte) in a.as_bytes().iter().zip(b.as_bytes()) {
        result |= a_byte ^ b_byte;
    }
    result == 0
}
