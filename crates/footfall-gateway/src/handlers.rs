//! One function per accepted message type (spec.md §4.4). Each returns
//! the JSON outbound frame to send; failures are reported inline in that
//! frame (`success: false, error: ...`) rather than as a `Result`, since
//! a failing handler must never close the session (spec.md §7
//! "Propagation").

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use footfall_chain::ChainGateway;
use footfall_common::error::FootfallError;
use footfall_common::models::pet::PetState;
use footfall_common::validation;
use footfall_crypto::canonical::SigningFields;
use footfall_db::repository::{devices, submissions};
use footfall_pet::PetOrchestrator;
use serde_json::{json, Value};

pub struct HandlerContext<'a> {
    pub pool: &'a sqlx::AnyPool,
    pub chain: Option<&'a Arc<ChainGateway>>,
    pub chain_deadline: Duration,
}

impl<'a> HandlerContext<'a> {
    fn chain_ref(&self) -> Option<&ChainGateway> {
        self.chain.map(|c| c.as_ref())
    }

    fn orchestrator(&self) -> PetOrchestrator<'_> {
        PetOrchestrator::new(self.pool, self.chain_ref(), self.chain_deadline)
    }
}

pub async fn register(ctx: &HandlerContext<'_>, device_id: &str, public_key: &str) -> Value {
    let result = do_register(ctx, device_id, public_key).await;
    match result {
        Ok((device, chain_handle, chain_tx)) => json!({
            "type": "register_response",
            "success": true,
            "deviceId": device.device_id,
            "chainDeviceHandle": chain_handle,
            "chainTxHandle": chain_tx,
        }),
        Err(e) => json!({ "type": "register_response", "success": false, "error": e.to_string() }),
    }
}

async fn do_register(
    ctx: &HandlerContext<'_>,
    device_id: &str,
    public_key: &str,
) -> Result<(footfall_common::models::device::Device, Option<String>, Option<String>), FootfallError> {
    validation::validate_device_id(device_id)?;
    let key_bytes = validation::decode_hex_exact(public_key, 32, "publicKey")?;
    let public_key_hex = hex::encode(&key_bytes);

    let now = Utc::now();
    let device = devices::register(ctx.pool, device_id, &public_key_hex, now).await?;

    let mut chain_handle = device.chain_device_handle.clone();
    let mut chain_tx = None;
    if chain_handle.is_none() {
        if let Some(chain) = ctx.chain {
            match tokio::time::timeout(ctx.chain_deadline, chain.register_device(device_id, &public_key_hex)).await
            {
                Ok(Ok(resp)) => {
                    devices::set_chain_handle(ctx.pool, device_id, &resp.chain_device_handle).await?;
                    chain_handle = Some(resp.chain_device_handle);
                    chain_tx = Some(resp.tx_handle);
                }
                Ok(Err(e)) => tracing::warn!(device_id, error = %e, "registerDevice chain mirror failed"),
                Err(_) => tracing::warn!(device_id, "registerDevice chain mirror timed out"),
            }
        }
    }

    Ok((device, chain_handle, chain_tx))
}

pub async fn authenticate(ctx: &HandlerContext<'_>, device_id: &str) -> Value {
    match devices::find_by_id(ctx.pool, device_id).await {
        Ok(Some(device)) => {
            let _ = devices::touch_last_seen(ctx.pool, device_id, Utc::now()).await;
            json!({ "type": "auth_response", "success": true, "deviceId": device.device_id })
        }
        Ok(None) => json!({
            "type": "auth_response",
            "success": false,
            "error": FootfallError::UnknownDevice.to_string(),
        }),
        Err(e) => {
            let e: FootfallError = e.into();
            json!({ "type": "auth_response", "success": false, "error": e.to_string() })
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn step_data(
    ctx: &HandlerContext<'_>,
    device_id: &str,
    step_count: i64,
    timestamp: i64,
    firmware_version: i64,
    battery_percent: i64,
    raw_acc_samples_json: &str,
    signature: &str,
) -> Value {
    match do_step_data(
        ctx,
        device_id,
        step_count,
        timestamp,
        firmware_version,
        battery_percent,
        raw_acc_samples_json,
        signature,
    )
    .await
    {
        Ok(id) => json!({
            "type": "step_data_response",
            "success": true,
            "dataId": id,
            "stepCount": step_count,
            "verified": true,
        }),
        Err(e) => json!({ "type": "step_data_response", "success": false, "error": e.to_string() }),
    }
}

async fn do_step_data(
    ctx: &HandlerContext<'_>,
    device_id: &str,
    step_count: i64,
    timestamp: i64,
    firmware_version: i64,
    battery_percent: i64,
    raw_acc_samples_json: &str,
    signature: &str,
) -> Result<i64, FootfallError> {
    let now = Utc::now();
    validation::validate_step_count(step_count)?;
    validation::validate_battery_percent(battery_percent)?;
    validation::validate_timestamp(timestamp, now)?;

    let samples: Value = serde_json::from_str(raw_acc_samples_json)
        .map_err(|_| FootfallError::Validation("rawAccSamples is not valid JSON".into()))?;
    let sample_count = samples.as_array().map(|a| a.len()).unwrap_or(0);
    validation::validate_sample_count(sample_count)?;

    let signature_bytes = validation::decode_hex_exact(signature, 64, "signature")?;
    let signature_array: [u8; 64] =
        signature_bytes.try_into().map_err(|_| FootfallError::Validation("signature must be 64 bytes".into()))?;

    let device = devices::find_by_id(ctx.pool, device_id)
        .await?
        .ok_or(FootfallError::UnknownDevice)?;
    let public_key =
        device.public_key_bytes().ok_or_else(|| FootfallError::Internal(anyhow::anyhow!("corrupt stored public key")))?;

    let fields = SigningFields {
        device_id,
        step_count,
        timestamp_ms: timestamp,
        firmware_version,
        battery_percent,
        raw_acc_samples_json,
    };
    if !footfall_crypto::verify(&fields, &signature_array, &public_key) {
        return Err(FootfallError::Signature);
    }

    let signature_hex = hex::encode(signature_array);
    let id = submissions::store(
        ctx.pool,
        &submissions::NewSubmission {
            device_id,
            step_count,
            timestamp_ms: timestamp,
            firmware_version,
            battery_percent,
            raw_samples_json: raw_acc_samples_json,
            signature_hex: &signature_hex,
        },
        now,
    )
    .await?;

    Ok(id)
}

pub fn pong() -> Value {
    json!({ "type": "pong", "timestamp": Utc::now().timestamp_millis() })
}

pub async fn get_pet(ctx: &HandlerContext<'_>, device_id: &str) -> Value {
    match ctx.orchestrator().get_pet(device_id).await {
        Ok(pet) => json!({ "type": "pet_data", "success": true, "pet": pet_json(&pet) }),
        Err(e) => pet_error(e),
    }
}

pub async fn update_pet(
    ctx: &HandlerContext<'_>,
    device_id: &str,
    pet_name: Option<String>,
    cosmetic: Option<String>,
) -> Value {
    match ctx.orchestrator().update_pet(device_id, pet_name, cosmetic).await {
        Ok(pet) => json!({ "type": "pet_updated", "success": true, "pet": pet_json(&pet) }),
        Err(e) => pet_error(e),
    }
}

pub async fn claim_resources(ctx: &HandlerContext<'_>, device_id: &str, steps: i64) -> Value {
    match ctx.orchestrator().claim_resources(device_id, steps).await {
        Ok(outcome) => json!({
            "type": "resources_claimed",
            "success": true,
            "foodGained": outcome.food_gained,
            "energyGained": outcome.energy_gained,
            "newFood": outcome.pet.food,
            "newEnergy": outcome.pet.energy,
        }),
        Err(e) => pet_error(e),
    }
}

pub async fn feed_pet(ctx: &HandlerContext<'_>, device_id: &str) -> Value {
    match ctx.orchestrator().feed_pet(device_id).await {
        Ok(outcome) => json!({
            "type": "pet_fed",
            "success": true,
            "evolved": outcome.evolved,
            "newLevel": outcome.new_level,
            "pet": pet_json(&outcome.pet),
        }),
        Err(e) => pet_error(e),
    }
}

pub async fn play_with_pet(ctx: &HandlerContext<'_>, device_id: &str) -> Value {
    match ctx.orchestrator().play_with_pet(device_id).await {
        Ok(pet) => json!({ "type": "pet_played", "success": true, "pet": pet_json(&pet) }),
        Err(e) => pet_error(e),
    }
}

fn pet_error(e: FootfallError) -> Value {
    json!({ "type": "pet_error", "success": false, "error": e.to_string() })
}

/// The `pet_data` nested object shape (spec.md §6).
fn pet_json(pet: &PetState) -> Value {
    json!({
        "pet_name": pet.pet_name,
        "device_id": pet.device_id,
        "level": pet.level,
        "experience": pet.experience,
        "total_steps_fed": pet.total_steps_fed,
        "happiness": pet.happiness,
        "hunger": pet.hunger,
        "health": pet.health,
        "food": pet.food,
        "energy": pet.energy,
        "pet_object_id": pet.chain_pet_handle,
        "on_chain": pet.on_chain(),
    })
}

pub fn error_frame(err: &FootfallError) -> Value {
    json!({ "type": "error", "success": false, "error": err.to_string() })
}

pub fn welcome() -> Value {
    json!({ "type": "welcome" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use footfall_crypto::canonical::SigningFields;
    use rand_core::OsRng;
    use sha2::{Digest, Sha256};

    async fn memory_pool() -> sqlx::AnyPool {
        let db = footfall_db::Database::connect_url("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db.pool
    }

    fn ctx(pool: &sqlx::AnyPool) -> HandlerContext<'_> {
        HandlerContext { pool, chain: None, chain_deadline: Duration::from_secs(5) }
    }

    fn sign(signing_key: &SigningKey, fields: &SigningFields<'_>) -> String {
        let canonical = footfall_crypto::canonicalize(fields);
        let digest = Sha256::digest(&canonical);
        hex::encode(signing_key.sign(&digest).to_bytes())
    }

    /// S1: register, authenticate, then a correctly signed `step_data`
    /// message is stored verified and unsubmitted.
    #[tokio::test]
    async fn happy_path_register_authenticate_and_submit() {
        let pool = memory_pool().await;
        let c = ctx(&pool);
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_key_hex = hex::encode(signing_key.verifying_key().to_bytes());

        let resp = register(&c, "d1", &public_key_hex).await;
        assert!(resp["success"].as_bool().unwrap());

        let resp = authenticate(&c, "d1").await;
        assert!(resp["success"].as_bool().unwrap());

        let fields = SigningFields {
            device_id: "d1",
            step_count: 100,
            timestamp_ms: Utc::now().timestamp_millis(),
            firmware_version: 1,
            battery_percent: 85,
            raw_acc_samples_json: "[[1.0,2.0,3.0]]",
        };
        let signature = sign(&signing_key, &fields);

        let resp = step_data(
            &c,
            "d1",
            fields.step_count,
            fields.timestamp_ms,
            fields.firmware_version,
            fields.battery_percent,
            fields.raw_acc_samples_json,
            &signature,
        )
        .await;
        assert!(resp["success"].as_bool().unwrap());
        assert_eq!(resp["stepCount"], 100);
        assert_eq!(resp["verified"], true);

        let pending = submissions::list_pending(&pool, Some("d1")).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].verified);
        assert!(!pending[0].submitted);
    }

    /// S2: a claimed step count that doesn't match the signed payload is
    /// rejected — the signature no longer verifies.
    #[tokio::test]
    async fn tampered_step_count_fails_signature_verification() {
        let pool = memory_pool().await;
        let c = ctx(&pool);
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_key_hex = hex::encode(signing_key.verifying_key().to_bytes());
        register(&c, "d1", &public_key_hex).await;
        authenticate(&c, "d1").await;

        let fields = SigningFields {
            device_id: "d1",
            step_count: 100,
            timestamp_ms: Utc::now().timestamp_millis(),
            firmware_version: 1,
            battery_percent: 85,
            raw_acc_samples_json: "[[1.0,2.0,3.0]]",
        };
        let signature = sign(&signing_key, &fields);

        // The device signed 100 steps; the wire claims 101.
        let resp = step_data(
            &c,
            "d1",
            101,
            fields.timestamp_ms,
            fields.firmware_version,
            fields.battery_percent,
            fields.raw_acc_samples_json,
            &signature,
        )
        .await;
        assert!(!resp["success"].as_bool().unwrap());
        assert!(resp["error"].as_str().unwrap().contains("signature"));
    }

    /// S3: resubmitting the same (device, timestamp) pair is rejected the
    /// second time, and exactly one record is stored.
    #[tokio::test]
    async fn duplicate_submission_is_rejected() {
        let pool = memory_pool().await;
        let c = ctx(&pool);
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_key_hex = hex::encode(signing_key.verifying_key().to_bytes());
        register(&c, "d1", &public_key_hex).await;
        authenticate(&c, "d1").await;

        let fields = SigningFields {
            device_id: "d1",
            step_count: 100,
            timestamp_ms: Utc::now().timestamp_millis(),
            firmware_version: 1,
            battery_percent: 85,
            raw_acc_samples_json: "[[1.0,2.0,3.0]]",
        };
        let signature = sign(&signing_key, &fields);

        let send = || {
            step_data(
                &c,
                "d1",
                fields.step_count,
                fields.timestamp_ms,
                fields.firmware_version,
                fields.battery_percent,
                fields.raw_acc_samples_json,
                &signature,
            )
        };
        let first = send().await;
        assert!(first["success"].as_bool().unwrap());
        let second = send().await;
        assert!(!second["success"].as_bool().unwrap());
        assert!(second["error"].as_str().unwrap().contains("duplicate"));

        let pending = submissions::list_pending(&pool, Some("d1")).await.unwrap();
        assert_eq!(pending.len(), 1);
    }

    /// S4: a timestamp more than 7 days in the past is rejected.
    #[tokio::test]
    async fn stale_timestamp_is_rejected() {
        let pool = memory_pool().await;
        let c = ctx(&pool);
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_key_hex = hex::encode(signing_key.verifying_key().to_bytes());
        register(&c, "d1", &public_key_hex).await;
        authenticate(&c, "d1").await;

        let timestamp_ms = (Utc::now() - chrono::Duration::days(8)).timestamp_millis();
        let fields = SigningFields {
            device_id: "d1",
            step_count: 100,
            timestamp_ms,
            firmware_version: 1,
            battery_percent: 85,
            raw_acc_samples_json: "[[1.0,2.0,3.0]]",
        };
        let signature = sign(&signing_key, &fields);

        let resp = step_data(
            &c,
            "d1",
            fields.step_count,
            fields.timestamp_ms,
            fields.firmware_version,
            fields.battery_percent,
            fields.raw_acc_samples_json,
            &signature,
        )
        .await;
        assert!(!resp["success"].as_bool().unwrap());
        assert!(resp["error"].as_str().unwrap().contains("timestamp"));
    }

    /// `pet_object_id` mirrors the on-chain handle, not the internal row id.
    #[test]
    fn pet_json_emits_chain_handle_not_row_id() {
        let pet = PetState::new("d1", Utc::now());
        let json = pet_json(&pet);
        assert!(json["pet_object_id"].is_null());

        let mut on_chain = pet;
        on_chain.chain_pet_handle = Some("0xpet1".into());
        let json = pet_json(&on_chain);
        assert_eq!(json["pet_object_id"], "0xpet1");
    }
}
