//! Typed request/response shapes for the eight chain operations named in
//! spec.md §4.5. Ported from `nexus-federation`'s typed event/transaction
//! structs; the concrete wire contract is an external collaborator, so
//! these are intentionally minimal and permissive (`#[serde(default)]`
//! on every optional field).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct RegisterDeviceRequest<'a> {
    pub device_id: &'a str,
    pub public_key_hex: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterDeviceResponse {
    pub chain_device_handle: String,
    pub tx_handle: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitStepDataRequest<'a> {
    pub chain_device_handle: &'a str,
    pub total_steps: i64,
    pub timestamps: &'a [i64],
    pub signatures: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitStepDataResponse {
    pub tx_handle: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePetRequest<'a> {
    pub name: &'a str,
    pub device_id: &'a str,
    pub color: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePetResponse {
    pub chain_pet_handle: String,
    pub tx_handle: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClaimResourcesRequest<'a> {
    pub chain_pet_handle: &'a str,
    pub steps: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimResourcesResponse {
    pub food_gained: i64,
    pub energy_gained: i64,
    pub new_food: i64,
    pub new_energy: i64,
    pub tx_handle: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedPetRequest<'a> {
    pub chain_pet_handle: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedPetResponse {
    #[serde(default)]
    pub evolved: bool,
    #[serde(default)]
    pub new_level: Option<i32>,
    pub tx_handle: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayWithPetRequest<'a> {
    pub chain_pet_handle: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayWithPetResponse {
    pub tx_handle: String,
}

/// The authoritative bounded-field snapshot the chain returns for a pet.
/// Overwrites local bounded fields on success (spec.md §4.7).
#[derive(Debug, Clone, Deserialize)]
pub struct PetSnapshot {
    pub level: i32,
    pub experience: i64,
    pub happiness: i32,
    pub hunger: i32,
    pub health: i32,
    pub food: i64,
    pub energy: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    pub balance: String,
}
