//! Submission repository — storing verified batches and draining them
//! toward the chain (spec.md §4.3).

use chrono::{DateTime, Utc};
use footfall_common::error::FootfallError;
use footfall_common::models::submission::SubmissionRecord;

/// Fields needed to store a freshly verified submission.
pub struct NewSubmission<'a> {
    pub device_id: &'a str,
    pub step_count: i64,
    pub timestamp_ms: i64,
    pub firmware_version: i64,
    pub battery_percent: i64,
    pub raw_samples_json: &'a str,
    pub signature_hex: &'a str,
}

/// Atomically insert a verified submission, bump the owning device's
/// cumulative step count, and touch `last_seen`.
///
/// Rejects with `UnknownDevice` if the device does not exist, and with
/// `Duplicate` if `(device_id, timestamp_ms)` was already stored.
pub async fn store(
    pool: &sqlx::AnyPool,
    submission: &NewSubmission<'_>,
    now: DateTime<Utc>,
) -> Result<i64, FootfallError> {
    let mut tx = pool.begin().await?;

    let device_exists =
        sqlx::query("SELECT 1 FROM devices WHERE device_id = ?")
            .bind(submission.device_id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
    if !device_exists {
        return Err(FootfallError::UnknownDevice);
    }

    let already_exists = sqlx::query(
        "SELECT 1 FROM submissions WHERE device_id = ? AND timestamp_ms = ?",
    )
    .bind(submission.device_id)
    .bind(submission.timestamp_ms)
    .fetch_optional(&mut *tx)
    .await?
    .is_some();
    if already_exists {
        return Err(FootfallError::Duplicate);
    }

    sqlx::query(
        r#"
        INSERT INTO submissions
            (device_id, step_count, timestamp_ms, firmware_version, battery_percent,
             raw_samples_json, signature_hex, verified, received_at, submitted, chain_tx_handle)
        VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, 0, NULL)
        "#,
    )
    .bind(submission.device_id)
    .bind(submission.step_count)
    .bind(submission.timestamp_ms)
    .bind(submission.firmware_version)
    .bind(submission.battery_percent)
    .bind(submission.raw_samples_json)
    .bind(submission.signature_hex)
    .bind(now.to_rfc3339())
    .execute(&mut *tx)
    .await?;

    let id: (i64,) = sqlx::query_as(
        "SELECT id FROM submissions WHERE device_id = ? AND timestamp_ms = ?",
    )
    .bind(submission.device_id)
    .bind(submission.timestamp_ms)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE devices SET total_steps = total_steps + ?, last_seen = ? WHERE device_id = ?",
    )
    .bind(submission.step_count)
    .bind(now.to_rfc3339())
    .bind(submission.device_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(id.0)
}

/// Verified-but-unsubmitted records, ordered by receive time ascending.
/// Optionally scoped to a single device.
pub async fn list_pending(
    pool: &sqlx::AnyPool,
    device_id: Option<&str>,
) -> Result<Vec<SubmissionRecord>, sqlx::Error> {
    match device_id {
        Some(id) => {
            sqlx::query_as::<_, SubmissionRecord>(
                "SELECT * FROM submissions WHERE verified = 1 AND submitted = 0 AND device_id = ? ORDER BY received_at ASC",
            )
            .bind(id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, SubmissionRecord>(
                "SELECT * FROM submissions WHERE verified = 1 AND submitted = 0 ORDER BY received_at ASC",
            )
            .fetch_all(pool)
            .await
        }
    }
}

/// Atomically flip `submitted = true` and attach `chain_tx_handle` on every
/// listed id, and increment `total_submissions` on each distinct affected
/// device exactly once. Either all listed ids flip, or (on any error) none
/// do — a single commit (spec.md §4.3).
pub async fn mark_submitted(
    pool: &sqlx::AnyPool,
    ids: &[i64],
    chain_tx_handle: &str,
) -> Result<(), FootfallError> {
    if ids.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    let mut device_ids: Vec<String> = Vec::new();
    for &id in ids {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT device_id FROM submissions WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if let Some((device_id,)) = row {
            if !device_ids.contains(&device_id) {
                device_ids.push(device_id);
            }
        }

        sqlx::query("UPDATE submissions SET submitted = 1, chain_tx_handle = ? WHERE id = ?")
            .bind(chain_tx_handle)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    for device_id in &device_ids {
        sqlx::query("UPDATE devices SET total_submissions = total_submissions + 1 WHERE device_id = ?")
            .bind(device_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}
