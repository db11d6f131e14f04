//! Submission record model — one verified (or rejected) activity batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum accepted step count in a single submission.
pub const MAX_STEP_COUNT: i64 = 100_000;
/// Maximum accumulator-sample triples carried in one submission.
pub const MAX_SAMPLES: usize = 30;

/// A verified activity batch, as persisted by the durable store.
///
/// Once `verified` is `true` the payload fields below must never be
/// mutated again — only `submitted` and `chain_tx_handle` may change,
/// and only together, exactly once (§4.3).
/// Decoded from `AnyRow` by the manual `FromRow` impl in
/// [`crate::any_row`] — `AnyPool` has no native `DateTime<Utc>` decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: i64,
    pub device_id: String,

    pub step_count: i64,
    /// Device-supplied wall-clock time of the batch, milliseconds since epoch.
    pub timestamp_ms: i64,
    pub firmware_version: i64,
    pub battery_percent: i64,

    /// Raw JSON text of the `rawAccSamples` array exactly as received on the
    /// wire. Kept as text (not re-parsed into `f64`) so that a future
    /// replay of the signed payload reproduces the exact bytes that were
    /// signed — see footfall-crypto::canonical.
    pub raw_samples_json: String,

    /// 64-byte Ed25519 signature, lowercase hex-encoded.
    pub signature_hex: String,

    pub verified: bool,
    pub received_at: DateTime<Utc>,

    pub submitted: bool,
    /// Opaque chain transaction handle, set exactly once alongside `submitted`.
    pub chain_tx_handle: Option<String>,
}

impl SubmissionRecord {
    pub fn is_pending(&self) -> bool {
        self.verified && !self.submitted
    }
}
