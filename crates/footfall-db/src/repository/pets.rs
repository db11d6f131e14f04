//! Pet-state repository — persistence only; decay/feed/play rules live in
//! `footfall-pet`.

use footfall_common::models::pet::PetState;

pub async fn find_by_device(
    pool: &sqlx::AnyPool,
    device_id: &str,
) -> Result<Option<PetState>, sqlx::Error> {
    sqlx::query_as::<_, PetState>("SELECT * FROM pets WHERE device_id = ?")
        .bind(device_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert(pool: &sqlx::AnyPool, pet: &PetState) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO pets
            (id, device_id, pet_name, level, experience, total_steps_fed,
             happiness, hunger, health, food, energy,
             created_at, last_fed_at, last_played_at, cosmetic, chain_pet_handle)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(pet.id.to_string())
    .bind(&pet.device_id)
    .bind(&pet.pet_name)
    .bind(pet.level)
    .bind(pet.experience)
    .bind(pet.total_steps_fed)
    .bind(pet.happiness)
    .bind(pet.hunger)
    .bind(pet.health)
    .bind(pet.food)
    .bind(pet.energy)
    .bind(pet.created_at.to_rfc3339())
    .bind(pet.last_fed_at.to_rfc3339())
    .bind(pet.last_played_at.to_rfc3339())
    .bind(&pet.cosmetic)
    .bind(&pet.chain_pet_handle)
    .execute(pool)
    .await?;
    Ok(())
}

/// Overwrite every mutable field of a pet row. Callers apply decay, feed,
/// play, claim, or chain-mirror rules first and persist the result here.
pub async fn save(pool: &sqlx::AnyPool, pet: &PetState) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE pets SET
            pet_name = ?, level = ?, experience = ?, total_steps_fed = ?,
            happiness = ?, hunger = ?, health = ?, food = ?, energy = ?,
            last_fed_at = ?, last_played_at = ?, cosmetic = ?, chain_pet_handle = ?
        WHERE device_id = ?
        "#,
    )
    .bind(&pet.pet_name)
    .bind(pet.level)
    .bind(pet.experience)
    .bind(pet.total_steps_fed)
    .bind(pet.happiness)
    .bind(pet.hunger)
    .bind(pet.health)
    .bind(pet.food)
    .bind(pet.energy)
    .bind(pet.last_fed_at.to_rfc3339())
    .bind(pet.last_played_at.to_rfc3339())
    .bind(&pet.cosmetic)
    .bind(&pet.chain_pet_handle)
    .bind(&pet.device_id)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::devices;
    use crate::Database;
    use chrono::Utc;

    async fn memory_db() -> Database {
        let db = Database::connect_url("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn insert_then_find_round_trips_uuid_and_timestamps() {
        let db = memory_db().await;
        let now = Utc::now();
        devices::register(&db.pool, "d1", "ab".repeat(32).as_str(), now).await.unwrap();

        let pet = PetState::new("d1", now);
        insert(&db.pool, &pet).await.unwrap();

        let found = find_by_device(&db.pool, "d1").await.unwrap().unwrap();
        assert_eq!(found.id, pet.id);
        assert_eq!(found.pet_name, "Footling");
        assert_eq!(found.created_at.timestamp(), now.timestamp());
        assert_eq!(found.last_fed_at.timestamp(), now.timestamp());
        assert!(found.chain_pet_handle.is_none());
    }

    #[tokio::test]
    async fn save_overwrites_mutable_fields() {
        let db = memory_db().await;
        let now = Utc::now();
        devices::register(&db.pool, "d1", "cd".repeat(32).as_str(), now).await.unwrap();

        let mut pet = PetState::new("d1", now);
        insert(&db.pool, &pet).await.unwrap();

        pet.experience = 150;
        pet.recompute_level();
        pet.food = 9;
        pet.chain_pet_handle = Some("0xpet1".into());
        let later = now + chrono::Duration::minutes(10);
        pet.last_fed_at = later;
        save(&db.pool, &pet).await.unwrap();

        let found = find_by_device(&db.pool, "d1").await.unwrap().unwrap();
        assert_eq!(found.level, 1);
        assert_eq!(found.food, 9);
        assert_eq!(found.chain_pet_handle.as_deref(), Some("0xpet1"));
        assert_eq!(found.last_fed_at.timestamp(), later.timestamp());
        // created_at is never touched by save().
        assert_eq!(found.created_at.timestamp(), now.timestamp());
    }
}
