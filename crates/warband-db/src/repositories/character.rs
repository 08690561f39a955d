//! PostgreSQL implementation of CharacterRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use warband_core::entities::Character;
use warband_core::traits::{CharacterRepository, RepoResult};
use warband_core::value_objects::Snowflake;

use crate::models::CharacterModel;

use super::error::{character_not_found, map_db_error};

/// PostgreSQL implementation of CharacterRepository
#[derive(Clone)]
pub struct PgCharacterRepository {
    pool: PgPool,
}

impl PgCharacterRepository {
    /// Create a new PgCharacterRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CharacterRepository for PgCharacterRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Character>> {
        let result = sqlx::query_as::<_, CharacterModel>(
            r"
            SELECT id, profile_id, name, class_name, level, is_main
            FROM characters
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Character::from))
    }

    #[instrument(skip(self))]
    async fn find_by_profile(&self, profile_id: Snowflake) -> RepoResult<Vec<Character>> {
        let results = sqlx::query_as::<_, CharacterModel>(
            r"
            SELECT id, profile_id, name, class_name, level, is_main
            FROM characters
            WHERE profile_id = $1
            ORDER BY is_main DESC, name
            ",
        )
        .bind(profile_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Character::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_main(&self, profile_id: Snowflake) -> RepoResult<Option<Character>> {
        let result = sqlx::query_as::<_, CharacterModel>(
            r"
            SELECT id, profile_id, name, class_name, level, is_main
            FROM characters
            WHERE profile_id = $1 AND is_main
            ",
        )
        .bind(profile_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Character::from))
    }

    #[instrument(skip(self, character))]
    async fn create(&self, character: &Character) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        if character.is_main {
            sqlx::query("UPDATE characters SET is_main = FALSE WHERE profile_id = $1 AND is_main")
                .bind(character.profile_id.into_inner())
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
        }

        sqlx::query(
            r"
            INSERT INTO characters (id, profile_id, name, class_name, level, is_main)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(character.id.into_inner())
        .bind(character.profile_id.into_inner())
        .bind(&character.name)
        .bind(&character.class_name)
        .bind(character.level)
        .bind(character.is_main)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)
    }

    #[instrument(skip(self, character))]
    async fn update(&self, character: &Character) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        if character.is_main {
            sqlx::query(
                "UPDATE characters SET is_main = FALSE WHERE profile_id = $1 AND id <> $2 AND is_main",
            )
            .bind(character.profile_id.into_inner())
            .bind(character.id.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        let result = sqlx::query(
            r"
            UPDATE characters
            SET name = $2, class_name = $3, level = $4, is_main = $5
            WHERE id = $1
            ",
        )
        .bind(character.id.into_inner())
        .bind(&character.name)
        .bind(&character.class_name)
        .bind(character.level)
        .bind(character.is_main)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(character_not_found(character.id));
        }

        tx.commit().await.map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM characters WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(character_not_found(id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgCharacterRepository>();
    }
}
