//! PostgreSQL implementation of ProfileRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use warband_core::entities::Profile;
use warband_core::traits::{ProfileRepository, RepoResult};
use warband_core::value_objects::Snowflake;

use crate::mappers::availability_to_json;
use crate::models::ProfileModel;

use super::error::{map_db_error, map_unique_violation, profile_not_found};

/// PostgreSQL implementation of ProfileRepository
#[derive(Clone)]
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    /// Create a new PgProfileRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Profile>> {
        let result = sqlx::query_as::<_, ProfileModel>(
            r"
            SELECT id, family_name, external_id, availability, auto_sign_up
            FROM profiles
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Profile::from))
    }

    #[instrument(skip(self))]
    async fn find_by_external_id(&self, external_id: &str) -> RepoResult<Option<Profile>> {
        let result = sqlx::query_as::<_, ProfileModel>(
            r"
            SELECT id, family_name, external_id, availability, auto_sign_up
            FROM profiles
            WHERE external_id = $1
            ",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Profile::from))
    }

    #[instrument(skip(self))]
    async fn find_by_family_name(&self, family_name: &str) -> RepoResult<Option<Profile>> {
        let result = sqlx::query_as::<_, ProfileModel>(
            r"
            SELECT id, family_name, external_id, availability, auto_sign_up
            FROM profiles
            WHERE LOWER(family_name) = LOWER($1)
            ",
        )
        .bind(family_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Profile::from))
    }

    #[instrument(skip(self, profile))]
    async fn create(&self, profile: &Profile) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO profiles (id, family_name, external_id, availability, auto_sign_up)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(profile.id.into_inner())
        .bind(&profile.family_name)
        .bind(&profile.external_id)
        .bind(availability_to_json(&profile.availability))
        .bind(profile.auto_sign_up)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || {
                warband_core::DomainError::ValidationError("family name already taken".to_string())
            })
        })?;

        Ok(())
    }

    #[instrument(skip(self, profile))]
    async fn update(&self, profile: &Profile) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE profiles
            SET family_name = $2, external_id = $3, availability = $4, auto_sign_up = $5
            WHERE id = $1
            ",
        )
        .bind(profile.id.into_inner())
        .bind(&profile.family_name)
        .bind(&profile.external_id)
        .bind(availability_to_json(&profile.availability))
        .bind(profile.auto_sign_up)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(profile_not_found(profile.id));
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
        assert_send_sync::<PgProfileRepository>();
    }
}
