//! PostgreSQL implementation of CallSignRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use warband_core::entities::WarCallSign;
use warband_core::traits::{CallSignRepository, RepoResult};
use warband_core::value_objects::Snowflake;

use crate::models::CallSignModel;

use super::error::{call_sign_not_found, map_db_error};

/// PostgreSQL implementation of CallSignRepository
#[derive(Clone)]
pub struct PgCallSignRepository {
    pool: PgPool,
}

impl PgCallSignRepository {
    /// Create a new PgCallSignRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<CallSignModel> for WarCallSign {
    fn from(model: CallSignModel) -> Self {
        WarCallSign {
            id: Snowflake::new(model.id),
            war_id: Snowflake::new(model.war_id),
            name: model.name,
        }
    }
}

#[async_trait]
impl CallSignRepository for PgCallSignRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<WarCallSign>> {
        let result = sqlx::query_as::<_, CallSignModel>(
            "SELECT id, war_id, name FROM war_call_signs WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(WarCallSign::from))
    }

    #[instrument(skip(self))]
    async fn find_by_war(&self, war_id: Snowflake) -> RepoResult<Vec<WarCallSign>> {
        let results = sqlx::query_as::<_, CallSignModel>(
            "SELECT id, war_id, name FROM war_call_signs WHERE war_id = $1 ORDER BY name",
        )
        .bind(war_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(WarCallSign::from).collect())
    }

    #[instrument(skip(self, call_sign))]
    async fn create(&self, call_sign: &WarCallSign) -> RepoResult<()> {
        sqlx::query("INSERT INTO war_call_signs (id, war_id, name) VALUES ($1, $2, $3)")
            .bind(call_sign.id.into_inner())
            .bind(call_sign.war_id.into_inner())
            .bind(&call_sign.name)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, call_sign))]
    async fn update(&self, call_sign: &WarCallSign) -> RepoResult<()> {
        let result = sqlx::query("UPDATE war_call_signs SET name = $2 WHERE id = $1")
            .bind(call_sign.id.into_inner())
            .bind(&call_sign.name)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(call_sign_not_found(call_sign.id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        // Memberships cascade via foreign key
        let result = sqlx::query("DELETE FROM war_call_signs WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(call_sign_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_members(&self, call_sign_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        let results = sqlx::query_scalar::<_, i64>(
            "SELECT attendance_id FROM call_sign_members WHERE call_sign_id = $1 ORDER BY attendance_id",
        )
        .bind(call_sign_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Snowflake::new).collect())
    }

    #[instrument(skip(self))]
    async fn add_member(
        &self,
        call_sign_id: Snowflake,
        attendance_id: Snowflake,
    ) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO call_sign_members (call_sign_id, attendance_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(call_sign_id.into_inner())
        .bind(attendance_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_member(
        &self,
        call_sign_id: Snowflake,
        attendance_id: Snowflake,
    ) -> RepoResult<()> {
        sqlx::query(
            "DELETE FROM call_sign_members WHERE call_sign_id = $1 AND attendance_id = $2",
        )
        .bind(call_sign_id.into_inner())
        .bind(attendance_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgCallSignRepository>();
    }
}
