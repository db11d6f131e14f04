//! Device repository — registration and lookup.

use chrono::{DateTime, Utc};
use footfall_common::error::FootfallError;
use footfall_common::models::device::Device;

/// Register a device, or touch `last_seen` if it already exists.
///
/// Idempotent on re-registration of the same device id (spec.md §4.3).
/// Rejects if a *different* device id already holds this public key —
/// the spec.md §9 open question on re-registration-with-a-different-key
/// is resolved the other direction here: a public key collision across
/// device ids is always a validation error, never a silent upsert.
pub async fn register(
    pool: &sqlx::AnyPool,
    device_id: &str,
    public_key_hex: &str,
    now: DateTime<Utc>,
) -> Result<Device, FootfallError> {
    if let Some(existing) = find_by_id(pool, device_id).await? {
        if existing.public_key_hex != public_key_hex {
            return Err(FootfallError::Validation(
                "device id already registered with a different public key".into(),
            ));
        }
        sqlx::query("UPDATE devices SET last_seen = ? WHERE device_id = ?")
            .bind(now.to_rfc3339())
            .bind(device_id)
            .execute(pool)
            .await?;
        return find_by_id(pool, device_id)
            .await?
            .ok_or_else(|| FootfallError::Internal(anyhow::anyhow!("device vanished after update")));
    }

    if let Some(owner) = find_by_public_key(pool, public_key_hex).await? {
        if owner.device_id != device_id {
            return Err(FootfallError::Validation(
                "public key already registered under a different device id".into(),
            ));
        }
    }

    sqlx::query(
        r#"
        INSERT INTO devices
            (device_id, public_key_hex, registered_at, last_seen, total_steps, total_submissions, status, chain_device_handle)
        VALUES (?, ?, ?, ?, 0, 0, 'active', NULL)
        "#,
    )
    .bind(device_id)
    .bind(public_key_hex)
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    find_by_id(pool, device_id)
        .await?
        .ok_or_else(|| FootfallError::Internal(anyhow::anyhow!("device vanished after insert")))
}

/// Read-only lookup used on the hot path (signature verification).
pub async fn find_by_id(pool: &sqlx::AnyPool, device_id: &str) -> Result<Option<Device>, sqlx::Error> {
    sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE device_id = ?")
        .bind(device_id)
        .fetch_optional(pool)
        .await
}

async fn find_by_public_key(
    pool: &sqlx::AnyPool,
    public_key_hex: &str,
) -> Result<Option<Device>, sqlx::Error> {
    sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE public_key_hex = ?")
        .bind(public_key_hex)
        .fetch_optional(pool)
        .await
}

/// Set the device's on-chain handle after a successful `registerDevice` call.
pub async fn set_chain_handle(
    pool: &sqlx::AnyPool,
    device_id: &str,
    chain_device_handle: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE devices SET chain_device_handle = ? WHERE device_id = ?")
        .bind(chain_device_handle)
        .bind(device_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Touch `last_seen` without any other side effect (used by `ping`).
pub async fn touch_last_seen(
    pool: &sqlx::AnyPool,
    device_id: &str,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE devices SET last_seen = ? WHERE device_id = ?")
        .bind(now.to_rfc3339())
        .bind(device_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn memory_db() -> Database {
        let db = Database::connect_url("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn register_then_find_round_trips_through_any_row() {
        let db = memory_db().await;
        let now = Utc::now();
        let device = register(&db.pool, "d1", "ab".repeat(32).as_str(), now).await.unwrap();
        assert_eq!(device.device_id, "d1");
        assert_eq!(device.total_steps, 0);
        assert!(device.is_active());

        let found = find_by_id(&db.pool, "d1").await.unwrap().unwrap();
        assert_eq!(found.public_key_hex, "ab".repeat(32));
        // registered_at/last_seen survive the string round trip through AnyRow.
        assert_eq!(found.registered_at.timestamp(), now.timestamp());
        assert_eq!(found.last_seen.timestamp(), now.timestamp());
    }

    #[tokio::test]
    async fn re_registering_same_key_touches_last_seen_without_new_row() {
        let db = memory_db().await;
        let first = Utc::now();
        register(&db.pool, "d1", "cd".repeat(32).as_str(), first).await.unwrap();

        let later = first + chrono::Duration::minutes(5);
        let device = register(&db.pool, "d1", "cd".repeat(32).as_str(), later).await.unwrap();
        assert_eq!(device.last_seen.timestamp(), later.timestamp());
        assert_eq!(device.registered_at.timestamp(), first.timestamp());
    }

    #[tokio::test]
    async fn re_registering_with_a_different_key_is_rejected() {
        let db = memory_db().await;
        let now = Utc::now();
        register(&db.pool, "d1", "11".repeat(32).as_str(), now).await.unwrap();
        let err = register(&db.pool, "d1", "22".repeat(32).as_str(), now).await.unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[tokio::test]
    async fn public_key_collision_across_device_ids_is_rejected() {
        let db = memory_db().await;
        let now = Utc::now();
        register(&db.pool, "d1", "33".repeat(32).as_str(), now).await.unwrap();
        let err = register(&db.pool, "d2", "33".repeat(32).as_str(), now).await.unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }
}
