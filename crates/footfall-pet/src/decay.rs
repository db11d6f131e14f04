//! Time-based decay — pure, independently testable (spec.md §4.7,
//! testable property 5: "decay monotonicity"). Applied on every read,
//! never on a timer, so a pet that is never queried simply accumulates
//! decay lazily.

use chrono::{DateTime, Utc};
use footfall_common::models::pet::{clamp_stat, PetState};

/// Apply decay to `pet` as of `now`, in place. Idempotent: calling twice
/// with the same `now` is a no-op on the second call because it advances
/// `last_fed_at`/`last_played_at` by whole units consumed.
pub fn apply_decay(pet: &mut PetState, now: DateTime<Utc>) {
    let hours_since_fed = whole_units(pet.last_fed_at, now, 1);
    if hours_since_fed > 0 {
        pet.hunger = clamp_stat(pet.hunger - hours_since_fed as i16);
        pet.last_fed_at = pet.last_fed_at + chrono::Duration::hours(hours_since_fed);
    }

    let two_hour_blocks_since_played = whole_units(pet.last_played_at, now, 2);
    if two_hour_blocks_since_played > 0 {
        pet.happiness = clamp_stat(pet.happiness - two_hour_blocks_since_played as i16);
        pet.last_played_at =
            pet.last_played_at + chrono::Duration::hours(two_hour_blocks_since_played * 2);
    }

    if pet.hunger < 20 || pet.happiness < 20 {
        pet.health = clamp_stat(pet.health - 1);
    } else if pet.hunger > 80 && pet.happiness > 80 {
        pet.health = clamp_stat(pet.health + 1);
    }
}

/// Number of whole `unit_hours`-hour blocks elapsed between `since` and `now`.
fn whole_units(since: DateTime<Utc>, now: DateTime<Utc>, unit_hours: i64) -> i64 {
    let elapsed_hours = (now - since).num_hours();
    if elapsed_hours <= 0 {
        0
    } else {
        elapsed_hours / unit_hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_pet(now: DateTime<Utc>) -> PetState {
        PetState::new("d1", now)
    }

    #[test]
    fn no_decay_when_just_created() {
        let now = Utc::now();
        let mut pet = fresh_pet(now);
        let (hunger, happiness, health) = (pet.hunger, pet.happiness, pet.health);
        apply_decay(&mut pet, now);
        assert_eq!((pet.hunger, pet.happiness, pet.health), (hunger, happiness, health));
    }

    #[test]
    fn hunger_decays_one_per_hour() {
        let now = Utc::now();
        let mut pet = fresh_pet(now);
        apply_decay(&mut pet, now + chrono::Duration::hours(5));
        assert_eq!(pet.hunger, 45);
    }

    #[test]
    fn happiness_decays_one_per_two_hours() {
        let now = Utc::now();
        let mut pet = fresh_pet(now);
        apply_decay(&mut pet, now + chrono::Duration::hours(6));
        assert_eq!(pet.happiness, 47);
    }

    #[test]
    fn health_drops_when_hunger_or_happiness_low() {
        let now = Utc::now();
        let mut pet = fresh_pet(now);
        pet.hunger = 15;
        apply_decay(&mut pet, now);
        assert_eq!(pet.health, 99);
    }

    #[test]
    fn health_recovers_when_both_high() {
        let now = Utc::now();
        let mut pet = fresh_pet(now);
        pet.hunger = 90;
        pet.happiness = 90;
        pet.health = 50;
        apply_decay(&mut pet, now);
        assert_eq!(pet.health, 51);
    }

    #[test]
    fn decay_never_drops_below_zero() {
        let now = Utc::now();
        let mut pet = fresh_pet(now);
        apply_decay(&mut pet, now + chrono::Duration::hours(10_000));
        assert_eq!(pet.hunger, 0);
        assert_eq!(pet.happiness, 0);
    }
}
