//! Pure interaction rules (spec.md §4.7 "Rules (authoritative)"). Each
//! function mutates a [`PetState`] already decayed by [`crate::decay`]
//! and returns whatever the caller needs to report back to the device.

use chrono::{DateTime, Utc};
use footfall_common::models::pet::clamp_stat;
use footfall_common::models::pet::PetState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("at least 100 steps are required to claim resources")]
    InsufficientSteps,
    #[error("no food available")]
    NoFood,
    #[error("no energy available")]
    NoEnergy,
}

pub struct ClaimOutcome {
    pub food_gained: i64,
    pub energy_gained: i64,
}

/// `claimResources(steps)`. Requires `steps >= 100`.
pub fn claim_resources(pet: &mut PetState, steps: i64) -> Result<ClaimOutcome, RuleError> {
    if steps < 100 {
        return Err(RuleError::InsufficientSteps);
    }
    let food_gained = steps / 100;
    let energy_gained = 2 * (steps / 150);
    pet.food += food_gained;
    pet.energy += energy_gained;
    pet.total_steps_fed += steps;
    Ok(ClaimOutcome { food_gained, energy_gained })
}

/// `feedPet`. Requires `food >= 1`. Returns the level before the call so
/// the caller can report whether the pet evolved.
pub fn feed_pet(pet: &mut PetState, now: DateTime<Utc>) -> Result<i16, RuleError> {
    if pet.food < 1 {
        return Err(RuleError::NoFood);
    }
    let previous_level = pet.level;
    pet.food -= 1;
    pet.hunger = clamp_stat(pet.hunger + 25);
    pet.happiness = clamp_stat(pet.happiness + 5);
    pet.experience += 10;
    pet.last_fed_at = now;
    pet.recompute_level();
    Ok(previous_level)
}

/// `playWithPet`. Requires `energy >= 1`.
pub fn play_with_pet(pet: &mut PetState, now: DateTime<Utc>) -> Result<(), RuleError> {
    if pet.energy < 1 {
        return Err(RuleError::NoEnergy);
    }
    pet.energy -= 1;
    pet.happiness = clamp_stat(pet.happiness + 15);
    pet.health = clamp_stat(pet.health + 3);
    pet.experience += 5;
    pet.last_played_at = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet() -> PetState {
        PetState::new("d1", Utc::now())
    }

    #[test]
    fn claim_resources_requires_minimum_steps() {
        let mut pet = pet();
        assert!(matches!(claim_resources(&mut pet, 99), Err(RuleError::InsufficientSteps)));
    }

    #[test]
    fn claim_resources_computes_gains() {
        let mut pet = pet();
        let outcome = claim_resources(&mut pet, 350).unwrap();
        assert_eq!(outcome.food_gained, 3);
        assert_eq!(outcome.energy_gained, 4);
        assert_eq!(pet.food, 5 + 3);
        assert_eq!(pet.energy, 5 + 4);
    }

    #[test]
    fn feed_pet_requires_food() {
        let mut pet = pet();
        pet.food = 0;
        assert!(matches!(feed_pet(&mut pet, Utc::now()), Err(RuleError::NoFood)));
    }

    #[test]
    fn feed_pet_applies_effects_and_clamps() {
        let mut pet = pet();
        pet.hunger = 90;
        pet.happiness = 98;
        let now = Utc::now();
        feed_pet(&mut pet, now).unwrap();
        assert_eq!(pet.food, 4);
        assert_eq!(pet.hunger, 100);
        assert_eq!(pet.happiness, 100);
        assert_eq!(pet.experience, 10);
        assert_eq!(pet.last_fed_at, now);
    }

    #[test]
    fn feed_pet_can_level_up() {
        let mut pet = pet();
        pet.food = 20;
        pet.experience = 95;
        let before = feed_pet(&mut pet, Utc::now()).unwrap();
        assert_eq!(before, 0);
        assert_eq!(pet.level, 1);
    }

    #[test]
    fn play_with_pet_requires_energy() {
        let mut pet = pet();
        pet.energy = 0;
        assert!(matches!(play_with_pet(&mut pet, Utc::now()), Err(RuleError::NoEnergy)));
    }

    #[test]
    fn play_with_pet_applies_effects() {
        let mut pet = pet();
        pet.happiness = 90;
        pet.health = 99;
        play_with_pet(&mut pet, Utc::now()).unwrap();
        assert_eq!(pet.energy, 4);
        assert_eq!(pet.happiness, 100);
        assert_eq!(pet.health, 100);
        assert_eq!(pet.experience, 5);
    }
}
