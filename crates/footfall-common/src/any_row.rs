//! Manual `sqlx::FromRow<'_, sqlx::any::AnyRow>` implementations for the
//! model types above.
//!
//! `sqlx::AnyPool` only decodes primitive types natively (i64, f64, bool,
//! String, bytes). UUID and DateTime columns must be decoded as `String`
//! and then parsed.
//!
//! **Why manual instead of `#[derive(sqlx::FromRow)]`?** The derive macro
//! generates a blanket `impl<DB>` with trait bounds that are unsatisfiable
//! for `AnyRow` (there is no `Decode<Any>` for `DateTime<Utc>` or `Uuid`),
//! so a struct carrying either field cannot compile with the derive
//! against an `AnyPool`. Writing the `AnyRow` impl by hand sidesteps this.

use chrono::{DateTime, Utc};
use sqlx::{any::AnyRow, Row};
use uuid::Uuid;

use crate::models::device::{Device, DeviceStatus};
use crate::models::pet::PetState;
use crate::models::submission::SubmissionRecord;

fn uuid(row: &AnyRow, col: &str) -> Result<Uuid, sqlx::Error> {
    let s: String = row.try_get(col)?;
    Uuid::parse_str(&s).map_err(|e| sqlx::Error::Decode(Box::new(e) as _))
}

fn dt(row: &AnyRow, col: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let s: String = row.try_get(col)?;
    parse_dt(&s).map_err(sqlx::Error::Decode)
}

fn boolean(row: &AnyRow, col: &str) -> Result<bool, sqlx::Error> {
    let n: i64 = row.try_get(col)?;
    Ok(n != 0)
}

fn parse_dt(s: &str) -> Result<DateTime<Utc>, Box<dyn std::error::Error + Send + Sync + 'static>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Ok(d.with_timezone(&Utc));
    }
    if let Ok(d) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(d.and_utc());
    }
    if let Ok(d) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(d.and_utc());
    }
    Err(format!("cannot parse timestamp '{s}'").into())
}

impl<'r> sqlx::FromRow<'r, AnyRow> for Device {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        Ok(Device {
            device_id: row.try_get("device_id")?,
            public_key_hex: row.try_get("public_key_hex")?,
            registered_at: dt(row, "registered_at")?,
            last_seen: dt(row, "last_seen")?,
            total_steps: row.try_get("total_steps")?,
            total_submissions: row.try_get("total_submissions")?,
            status: match status.as_str() {
                "active" => DeviceStatus::Active,
                "suspended" => DeviceStatus::Suspended,
                other => {
                    return Err(sqlx::Error::Decode(format!("unknown device status: {other}").into()))
                }
            },
            chain_device_handle: row.try_get("chain_device_handle")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, AnyRow> for PetState {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(PetState {
            id: uuid(row, "id")?,
            device_id: row.try_get("device_id")?,
            pet_name: row.try_get("pet_name")?,
            level: row.try_get("level")?,
            experience: row.try_get("experience")?,
            total_steps_fed: row.try_get("total_steps_fed")?,
            happiness: row.try_get("happiness")?,
            hunger: row.try_get("hunger")?,
            health: row.try_get("health")?,
            food: row.try_get("food")?,
            energy: row.try_get("energy")?,
            created_at: dt(row, "created_at")?,
            last_fed_at: dt(row, "last_fed_at")?,
            last_played_at: dt(row, "last_played_at")?,
            cosmetic: row.try_get("cosmetic")?,
            chain_pet_handle: row.try_get("chain_pet_handle")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, AnyRow> for SubmissionRecord {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(SubmissionRecord {
            id: row.try_get("id")?,
            device_id: row.try_get("device_id")?,
            step_count: row.try_get("step_count")?,
            timestamp_ms: row.try_get("timestamp_ms")?,
            firmware_version: row.try_get("firmware_version")?,
            battery_percent: row.try_get("battery_percent")?,
            raw_samples_json: row.try_get("raw_samples_json")?,
            signature_hex: row.try_get("signature_hex")?,
            verified: boolean(row, "verified")?,
            received_at: dt(row, "received_at")?,
            submitted: boolean(row, "submitted")?,
            chain_tx_handle: row.try_get("chain_tx_handle")?,
        })
    }
}
