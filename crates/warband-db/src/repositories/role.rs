//! PostgreSQL implementation of RoleRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use warband_core::entities::GuildRole;
use warband_core::traits::{RepoResult, RoleRepository};
use warband_core::value_objects::Snowflake;

use crate::models::RoleModel;

use super::error::{map_db_error, role_not_found};

/// PostgreSQL implementation of RoleRepository
#[derive(Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    /// Create a new PgRoleRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<GuildRole>> {
        let result = sqlx::query_as::<_, RoleModel>(
            r"
            SELECT id, name, priority, permissions FROM guild_roles WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(GuildRole::from))
    }

    #[instrument(skip(self))]
    async fn find_by_name(&self, name: &str) -> RepoResult<Option<GuildRole>> {
        let result = sqlx::query_as::<_, RoleModel>(
            r"
            SELECT id, name, priority, permissions FROM guild_roles WHERE name = $1
            ",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(GuildRole::from))
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> RepoResult<Vec<GuildRole>> {
        let results = sqlx::query_as::<_, RoleModel>(
            r"
            SELECT id, name, priority, permissions FROM guild_roles ORDER BY priority
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(GuildRole::from).collect())
    }

    #[instrument(skip(self, role))]
    async fn create(&self, role: &GuildRole) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO guild_roles (id, name, priority, permissions)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(role.id.into_inner())
        .bind(&role.name)
        .bind(role.priority)
        .bind(role.permissions.to_i64())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, role))]
    async fn update(&self, role: &GuildRole) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE guild_roles SET name = $2, priority = $3, permissions = $4 WHERE id = $1
            ",
        )
        .bind(role.id.into_inner())
        .bind(&role.name)
        .bind(role.priority)
        .bind(role.permissions.to_i64())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(role_not_found(role.id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM guild_roles WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(role_not_found(id));
        }

        Ok(())
    }
}
