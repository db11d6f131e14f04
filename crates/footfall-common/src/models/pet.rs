//! Derived pet state model — per-device counters mirroring on-chain state.
//!
//! All bounded fields (`happiness`, `hunger`, `health`) are clamped into
//! `0..=100` on every write; `level` is a monotonic function of
//! `experience`. See [`level_for_experience`] for the thresholds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Experience thresholds for levels 1..4 (level 0 is the default).
pub const LEVEL_THRESHOLDS: [i64; 4] = [100, 500, 2_000, 5_000];

pub const DEFAULT_HAPPINESS: i16 = 50;
pub const DEFAULT_HUNGER: i16 = 50;
pub const DEFAULT_HEALTH: i16 = 100;
pub const DEFAULT_FOOD: i64 = 5;
pub const DEFAULT_ENERGY: i64 = 5;

/// Derive the level for a given experience total.
pub fn level_for_experience(experience: i64) -> i16 {
    LEVEL_THRESHOLDS
        .iter()
        .filter(|&&t| experience >= t)
        .count() as i16
}

/// Clamp a bounded stat into `0..=100`.
pub fn clamp_stat(value: i16) -> i16 {
    value.clamp(0, 100)
}

/// A device's derived "pet" — the local-first, chain-mirrored game state.
///
/// Decoded from `AnyRow` by the manual `FromRow` impl in
/// [`crate::any_row`] — `AnyPool` has no native `Uuid`/`DateTime<Utc>`
/// decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetState {
    pub id: Uuid,
    pub device_id: String,

    pub pet_name: String,
    pub level: i16,
    pub experience: i64,
    pub total_steps_fed: i64,

    pub happiness: i16,
    pub hunger: i16,
    pub health: i16,

    pub food: i64,
    pub energy: i64,

    pub created_at: DateTime<Utc>,
    pub last_fed_at: DateTime<Utc>,
    pub last_played_at: DateTime<Utc>,

    /// Optional cosmetic string (skin, color, accessory id — opaque to the server).
    pub cosmetic: Option<String>,

    /// Opaque on-chain handle, set once `createPet` succeeds.
    pub chain_pet_handle: Option<String>,
}

impl PetState {
    pub fn new(device_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: crate::ids::generate_id(),
            device_id: device_id.into(),
            pet_name: "Footling".to_owned(),
            level: 0,
            experience: 0,
            total_steps_fed: 0,
            happiness: DEFAULT_HAPPINESS,
            hunger: DEFAULT_HUNGER,
            health: DEFAULT_HEALTH,
            food: DEFAULT_FOOD,
            energy: DEFAULT_ENERGY,
            created_at: now,
            last_fed_at: now,
            last_played_at: now,
            cosmetic: None,
            chain_pet_handle: None,
        }
    }

    /// Re-evaluate `level` against `experience`. Idempotent.
    pub fn recompute_level(&mut self) {
        self.level = level_for_experience(self.experience);
    }

    pub fn on_chain(&self) -> bool {
        self.chain_pet_handle.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_thresholds_are_monotonic() {
        assert_eq!(level_for_experience(0), 0);
        assert_eq!(level_for_experience(99), 0);
        assert_eq!(level_for_experience(100), 1);
        assert_eq!(level_for_experience(499), 1);
        assert_eq!(level_for_experience(500), 2);
        assert_eq!(level_for_experience(1_999), 2);
        assert_eq!(level_for_experience(2_000), 3);
        assert_eq!(level_for_experience(4_999), 3);
        assert_eq!(level_for_experience(5_000), 4);
        assert_eq!(level_for_experience(1_000_000), 4);
    }

    #[test]
    fn clamp_keeps_stats_in_bounds() {
        assert_eq!(clamp_stat(-5), 0);
        assert_eq!(clamp_stat(150), 100);
        assert_eq!(clamp_stat(42), 42);
    }
}
