/// Batch result types surfaced to admins
use super::schedule::ScheduledEmailJob;
use serde::{Deserialize, Serialize};

/// Per-guest row in a batch send result. Failures are data, never exceptions;
/// `error` carries a normalized reason string, not raw provider text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOutcome {
    pub guest_id: String,
    pub guest_name: String,
    pub email: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate per-batch send result
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SendReport {
    pub sent: u64,
    pub failed: u64,
    pub total: u64,
    pub results: Vec<SendOutcome>,
}

impl SendReport {
    pub fn push(&mut self, outcome: SendOutcome) {
        self.total += 1;
        if outcome.success {
            self.sent += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(outcome);
    }
}

/// Acknowledgement for a queued (not yet sent) batch. Guests that never made
/// it into the queue (bad address, missing record) show up as failure rows so
/// `queued + failed == total` always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedReport {
    pub queued: u64,
    pub failed: u64,
    pub total: u64,
    pub job_ids: Vec<String>,
    pub failures: Vec<SendOutcome>,
}

/// Result of cancelling a scheduled email batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResult {
    pub success: bool,
    pub scheduled_email: ScheduledEmailJob,
}
