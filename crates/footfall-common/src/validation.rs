//! Input validation helpers for inbound wire payloads.
//!
//! Centralized here so every bound named in spec.md §7 ("all bounds …
//! enforced before any store write") is checked in exactly one place.

use crate::error::FootfallError;
use crate::models::submission::{MAX_SAMPLES, MAX_STEP_COUNT};
use chrono::{DateTime, Duration, Utc};

/// Decode a `0x`-prefixed lowercase hex string into exactly `expected_len`
/// raw bytes.
pub fn decode_hex_exact(value: &str, expected_len: usize, field: &str) -> Result<Vec<u8>, FootfallError> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    let bytes = hex::decode(stripped)
        .map_err(|_| FootfallError::Validation(format!("{field} is not valid hex")))?;
    if bytes.len() != expected_len {
        return Err(FootfallError::Validation(format!(
            "{field} must be {expected_len} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Validate a device id is a non-empty, reasonably sized opaque string.
pub fn validate_device_id(device_id: &str) -> Result<(), FootfallError> {
    if device_id.is_empty() || device_id.len() > 128 {
        return Err(FootfallError::Validation(
            "deviceId must be 1-128 characters".into(),
        ));
    }
    Ok(())
}

/// Validate the step count bound: `1..=100_000` (spec.md §3).
pub fn validate_step_count(step_count: i64) -> Result<(), FootfallError> {
    if !(1..=MAX_STEP_COUNT).contains(&step_count) {
        return Err(FootfallError::Validation(format!(
            "stepCount must be between 1 and {MAX_STEP_COUNT}"
        )));
    }
    Ok(())
}

/// Validate the battery percent bound: `0..=100`.
pub fn validate_battery_percent(battery_percent: i64) -> Result<(), FootfallError> {
    if !(0..=100).contains(&battery_percent) {
        return Err(FootfallError::Validation("batteryPercent must be 0-100".into()));
    }
    Ok(())
}

/// Validate the accelerometer sample count bound: at most 30 triples.
pub fn validate_sample_count(sample_count: usize) -> Result<(), FootfallError> {
    if sample_count > MAX_SAMPLES {
        return Err(FootfallError::Validation(format!(
            "rawAccSamples must contain at most {MAX_SAMPLES} entries"
        )));
    }
    Ok(())
}

/// Validate the device-supplied timestamp tolerance (spec.md §7 TemporalError,
/// §9 open question — ±5 minute future tolerance at the verifier).
pub fn validate_timestamp(timestamp_ms: i64, now: DateTime<Utc>) -> Result<(), FootfallError> {
    let ts = DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .ok_or_else(|| FootfallError::Validation("timestamp is out of range".into()))?;

    let earliest = now - Duration::days(7);
    let latest = now + Duration::minutes(5);

    if ts < earliest || ts > latest {
        return Err(FootfallError::Temporal);
    }
    Ok(())
}
