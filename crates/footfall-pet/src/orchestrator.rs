//! Local-first derived-state orchestrator (spec.md §4.7, component G).
//!
//! Every operation applies its rule to the local store, persists, and —
//! if the pet has a chain handle — attempts a best-effort chain mirror
//! under a bounded deadline. A successful chain response authoritatively
//! overwrites the local bounded fields; a failed or timed-out mirror
//! leaves local state as the answer and is logged as a warning
//! (spec.md §9 "local-then-chain mirror race").

use std::time::Duration;

use chrono::Utc;
use footfall_chain::types::PetSnapshot;
use footfall_chain::ChainGateway;
use footfall_common::error::FootfallError;
use footfall_common::models::pet::PetState;
use footfall_db::repository::pets;

use crate::decay::apply_decay;
use crate::rules::{self, RuleError};

impl From<RuleError> for FootfallError {
    fn from(e: RuleError) -> Self {
        FootfallError::Validation(e.to_string())
    }
}

pub struct FeedOutcome {
    pub pet: PetState,
    pub evolved: bool,
    pub new_level: Option<i16>,
}

pub struct ClaimOutcome {
    pub pet: PetState,
    pub food_gained: i64,
    pub energy_gained: i64,
}

pub struct PetOrchestrator<'a> {
    pool: &'a sqlx::AnyPool,
    chain: Option<&'a ChainGateway>,
    chain_deadline: Duration,
}

impl<'a> PetOrchestrator<'a> {
    pub fn new(pool: &'a sqlx::AnyPool, chain: Option<&'a ChainGateway>, chain_deadline: Duration) -> Self {
        Self { pool, chain, chain_deadline }
    }

    /// `getPet`: load or create, apply decay, persist, and — if unmirrored
    /// — attempt `createPet` on the chain.
    pub async fn get_pet(&self, device_id: &str) -> Result<PetState, FootfallError> {
        let now = Utc::now();
        let mut pet = match pets::find_by_device(self.pool, device_id).await? {
            Some(pet) => pet,
            None => {
                let pet = PetState::new(device_id, now);
                pets::insert(self.pool, &pet).await?;
                pet
            }
        };

        apply_decay(&mut pet, now);

        if let (Some(chain), None) = (self.chain, &pet.chain_pet_handle) {
            match tokio::time::timeout(
                self.chain_deadline,
                chain.create_pet(&pet.pet_name, device_id, pet.cosmetic.as_deref()),
            )
            .await
            {
                Ok(Ok(resp)) => pet.chain_pet_handle = Some(resp.chain_pet_handle),
                Ok(Err(e)) => tracing::warn!(device_id, error = %e, "createPet chain mirror failed"),
                Err(_) => tracing::warn!(device_id, "createPet chain mirror timed out"),
            }
        }

        pets::save(self.pool, &pet).await?;
        Ok(pet)
    }

    /// `updatePet`: local-only cosmetic/name change. Not a chain operation
    /// (spec.md §4.5's chain surface has no updatePet counterpart).
    pub async fn update_pet(
        &self,
        device_id: &str,
        pet_name: Option<String>,
        cosmetic: Option<String>,
    ) -> Result<PetState, FootfallError> {
        let mut pet = self.get_pet(device_id).await?;
        if let Some(name) = pet_name {
            pet.pet_name = name;
        }
        if let Some(cosmetic) = cosmetic {
            pet.cosmetic = Some(cosmetic);
        }
        pets::save(self.pool, &pet).await?;
        Ok(pet)
    }

    pub async fn claim_resources(&self, device_id: &str, steps: i64) -> Result<ClaimOutcome, FootfallError> {
        let mut pet = self.get_pet(device_id).await?;
        let outcome = rules::claim_resources(&mut pet, steps)?;
        pets::save(self.pool, &pet).await?;

        let handle = pet.chain_pet_handle.clone();
        if let (Some(chain), Some(handle)) = (self.chain, handle.as_deref()) {
            match tokio::time::timeout(self.chain_deadline, chain.claim_resources(handle, steps)).await {
                Ok(Ok(resp)) => {
                    pet.food = resp.new_food;
                    pet.energy = resp.new_energy;
                    pets::save(self.pool, &pet).await?;
                }
                Ok(Err(e)) => tracing::warn!(device_id, error = %e, "claimResources chain mirror failed"),
                Err(_) => tracing::warn!(device_id, "claimResources chain mirror timed out"),
            }
        }

        Ok(ClaimOutcome { pet, food_gained: outcome.food_gained, energy_gained: outcome.energy_gained })
    }

    pub async fn feed_pet(&self, device_id: &str) -> Result<FeedOutcome, FootfallError> {
        let mut pet = self.get_pet(device_id).await?;
        let now = Utc::now();
        let previous_level = rules::feed_pet(&mut pet, now)?;
        pets::save(self.pool, &pet).await?;

        let mut evolved = pet.level > previous_level;
        let mut new_level = if evolved { Some(pet.level) } else { None };

        let handle = pet.chain_pet_handle.clone();
        if let (Some(chain), Some(handle)) = (self.chain, handle.as_deref()) {
            match tokio::time::timeout(self.chain_deadline, chain.feed_pet(handle)).await {
                Ok(Ok(resp)) => {
                    evolved = evolved || resp.evolved;
                    new_level = resp.new_level.map(|l| l as i16).or(new_level);
                    self.apply_chain_snapshot(&mut pet, handle).await;
                }
                Ok(Err(e)) => tracing::warn!(device_id, error = %e, "feedPet chain mirror failed"),
                Err(_) => tracing::warn!(device_id, "feedPet chain mirror timed out"),
            }
        }

        Ok(FeedOutcome { pet, evolved, new_level })
    }

    pub async fn play_with_pet(&self, device_id: &str) -> Result<PetState, FootfallError> {
        let mut pet = self.get_pet(device_id).await?;
        let now = Utc::now();
        rules::play_with_pet(&mut pet, now)?;
        pets::save(self.pool, &pet).await?;

        let handle = pet.chain_pet_handle.clone();
        if let (Some(chain), Some(handle)) = (self.chain, handle.as_deref()) {
            match tokio::time::timeout(self.chain_deadline, chain.play_with_pet(handle)).await {
                Ok(Ok(_)) => self.apply_chain_snapshot(&mut pet, handle).await,
                Ok(Err(e)) => tracing::warn!(device_id, error = %e, "playWithPet chain mirror failed"),
                Err(_) => tracing::warn!(device_id, "playWithPet chain mirror timed out"),
            }
        }

        Ok(pet)
    }

    /// Follow-up `getPet(chainPetHandle)` used after feed/play to pull the
    /// authoritative bounded-field snapshot (spec.md §4.5).
    async fn apply_chain_snapshot(&self, pet: &mut PetState, handle: &str) {
        let Some(chain) = self.chain else { return };
        match tokio::time::timeout(self.chain_deadline, chain.get_pet(handle)).await {
            Ok(Ok(Some(snapshot))) => {
                overwrite_bounded_fields(pet, &snapshot);
                if let Err(e) = pets::save(self.pool, pet).await {
                    tracing::warn!(device_id = %pet.device_id, error = %e, "failed to persist chain snapshot");
                }
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => tracing::warn!(device_id = %pet.device_id, error = %e, "getPet follow-up failed"),
            Err(_) => tracing::warn!(device_id = %pet.device_id, "getPet follow-up timed out"),
        }
    }
}

fn overwrite_bounded_fields(pet: &mut PetState, snapshot: &PetSnapshot) {
    pet.level = snapshot.level as i16;
    pet.experience = snapshot.experience;
    pet.happiness = snapshot.happiness as i16;
    pet.hunger = snapshot.hunger as i16;
    pet.health = snapshot.health as i16;
    pet.food = snapshot.food;
    pet.energy = snapshot.energy;
}
