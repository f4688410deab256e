/// Application constants
///
/// This module contains all hardcoded values used throughout the pipeline.
/// Constants are organized by category for easy maintenance.
// ============================================================================
// Delivery Queue
// ============================================================================
/// Maximum number of attempts per queued job (initial + retries)
pub const QUEUE_MAX_ATTEMPTS: u32 = 3;

/// Base delay for the queue's exponential backoff, in seconds
pub const QUEUE_RETRY_BASE_DELAY_SECS: u64 = 5;

/// How many exhausted (failed) jobs are retained for operator inspection
pub const FAILED_JOBS_RETAINED: usize = 100;

/// How many due jobs a worker claims per poll
pub const WORKER_CLAIM_BATCH: usize = 10;

/// Worker poll interval in milliseconds
pub const WORKER_POLL_INTERVAL_MS: u64 = 500;

// ============================================================================
// Transport
// ============================================================================

/// Bounded timeout for a single transport call, in seconds.
/// An exceeded timeout is a transport failure, eligible for queue retry.
pub const TRANSPORT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Retry Configuration (in-process, below the queue's own retry policy)
// ============================================================================

/// Maximum number of retries for transient failures
pub const MAX_RETRIES: u32 = 2;

/// Base delay for exponential backoff in milliseconds
pub const RETRY_BASE_DELAY_MS: u64 = 1000;

/// Maximum delay for exponential backoff in milliseconds
pub const RETRY_MAX_DELAY_MS: u64 = 30 * 1000;

/// Jitter factor for retry delays (0.0 to 1.0)
pub const RETRY_JITTER_FACTOR: f64 = 0.1;

// ============================================================================
// Webhooks
// ============================================================================

/// Header carrying the provider's HMAC signature (hex)
pub const SIGNATURE_HEADER: &str = "x-provider-signature";

/// Header carrying the timestamp the signature covers
pub const TIMESTAMP_HEADER: &str = "x-provider-timestamp";

// ============================================================================
// Size Limits
// ============================================================================

/// Maximum subject line length
pub const MAX_SUBJECT_LENGTH: usize = 998;

/// Maximum email address length (RFC 5321)
pub const MAX_EMAIL_ADDRESS_LENGTH: usize = 320;

// ============================================================================
// Validation Constants
// ============================================================================

/// Email validation regex (RFC 5322 simplified)
pub const EMAIL_REGEX_PATTERN: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";
