//! Device model — a registered hardware witness.
//!
//! A device's identity is an opaque string it chooses at registration.
//! Its Ed25519 public key never changes across its lifetime; every
//! submission it sends is verified against the key stored here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered sensor device.
///
/// Decoded from `AnyRow` by the manual `FromRow` impl in
/// [`crate::any_row`] — `AnyPool` has no native `DateTime<Utc>` decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Opaque identity chosen by the device at registration.
    pub device_id: String,

    /// 32-byte Ed25519 public key, lowercase hex-encoded for storage.
    pub public_key_hex: String,

    pub registered_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,

    /// Cumulative, monotonic step count across all verified submissions.
    pub total_steps: i64,
    /// Cumulative, monotonic count of submissions marked submitted-to-chain.
    pub total_submissions: i64,

    pub status: DeviceStatus,

    /// Opaque handle assigned by the chain after the first successful
    /// on-chain registration. `None` until then or when chain mirroring
    /// is disabled.
    pub chain_device_handle: Option<String>,
}

/// Device lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Active,
    Suspended,
}

impl Device {
    /// Decode the stored hex public key into raw bytes. Returns `None` if the
    /// stored value is malformed or not exactly 32 bytes (should not happen
    /// for rows written by this server, which validates on insert).
    pub fn public_key_bytes(&self) -> Option<[u8; 32]> {
        let bytes = hex::decode(self.public_key_hex.trim_start_matches("0x")).ok()?;
        bytes.try_into().ok()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, DeviceStatus::Active)
    }
}
