//! PostgreSQL implementation of GuildRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use warband_core::entities::{Guild, GuildIntegration};
use warband_core::traits::{GuildRepository, RepoResult};
use warband_core::value_objects::Snowflake;

use crate::mappers::{guild_from_model, integration_to_json};
use crate::models::GuildModel;

use super::error::{guild_not_found, map_db_error, map_unique_violation};

const GUILD_COLUMNS: &str = "id, name, description, logo_url, region, war_start_time, \
     external_id, webhook_url, notify_war_create, notify_war_cancel, notify_war_end, \
     reminder_minutes, role_map, member_cache";

/// PostgreSQL implementation of GuildRepository
#[derive(Clone)]
pub struct PgGuildRepository {
    pool: PgPool,
}

impl PgGuildRepository {
    /// Create a new PgGuildRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuildRepository for PgGuildRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Guild>> {
        let result = sqlx::query_as::<_, GuildModel>(&format!(
            "SELECT {GUILD_COLUMNS} FROM guilds WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(guild_from_model))
    }

    #[instrument(skip(self))]
    async fn find_by_profile(&self, profile_id: Snowflake) -> RepoResult<Vec<Guild>> {
        let results = sqlx::query_as::<_, GuildModel>(&format!(
            r"
            SELECT {GUILD_COLUMNS}
            FROM guilds g
            JOIN guild_members gm ON gm.guild_id = g.id
            WHERE gm.user_profile_id = $1
            ORDER BY gm.joined_at DESC
            "
        ))
        .bind(profile_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(guild_from_model).collect())
    }

    #[instrument(skip(self))]
    async fn find_integrated(&self) -> RepoResult<Vec<Guild>> {
        let results = sqlx::query_as::<_, GuildModel>(&format!(
            "SELECT {GUILD_COLUMNS} FROM guilds WHERE external_id IS NOT NULL"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(guild_from_model).collect())
    }

    #[instrument(skip(self))]
    async fn name_exists(&self, name: &str, region: &str) -> RepoResult<bool> {
        let result = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(SELECT 1 FROM guilds WHERE LOWER(name) = LOWER($1) AND region = $2)
            ",
        )
        .bind(name)
        .bind(region)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result)
    }

    #[instrument(skip(self, guild))]
    async fn create(&self, guild: &Guild) -> RepoResult<()> {
        let (role_map, member_cache) = integration_to_json(&guild.integration);

        sqlx::query(
            r"
            INSERT INTO guilds (id, name, description, logo_url, region, war_start_time,
                external_id, webhook_url, notify_war_create, notify_war_cancel, notify_war_end,
                reminder_minutes, role_map, member_cache)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ",
        )
        .bind(guild.id.into_inner())
        .bind(&guild.name)
        .bind(&guild.description)
        .bind(&guild.logo_url)
        .bind(&guild.region)
        .bind(guild.war_start_time)
        .bind(&guild.integration.external_id)
        .bind(&guild.integration.webhook_url)
        .bind(guild.integration.notifications.war_create)
        .bind(guild.integration.notifications.war_cancel)
        .bind(guild.integration.notifications.war_end)
        .bind(guild.integration.reminder_minutes)
        .bind(role_map)
        .bind(member_cache)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || warband_core::DomainError::GuildNameExists))?;

        Ok(())
    }

    #[instrument(skip(self, guild))]
    async fn update(&self, guild: &Guild) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE guilds
            SET name = $2, description = $3, logo_url = $4, region = $5, war_start_time = $6
            WHERE id = $1
            ",
        )
        .bind(guild.id.into_inner())
        .bind(&guild.name)
        .bind(&guild.description)
        .bind(&guild.logo_url)
        .bind(&guild.region)
        .bind(guild.war_start_time)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || warband_core::DomainError::GuildNameExists))?;

        if result.rows_affected() == 0 {
            return Err(guild_not_found(guild.id));
        }

        Ok(())
    }

    #[instrument(skip(self, integration))]
    async fn update_integration(
        &self,
        guild_id: Snowflake,
        integration: &GuildIntegration,
    ) -> RepoResult<()> {
        let (role_map, member_cache) = integration_to_json(integration);

        let result = sqlx::query(
            r"
            UPDATE guilds
            SET external_id = $2, webhook_url = $3, notify_war_create = $4,
                notify_war_cancel = $5, notify_war_end = $6, reminder_minutes = $7,
                role_map = $8, member_cache = $9
            WHERE id = $1
            ",
        )
        .bind(guild_id.into_inner())
        .bind(&integration.external_id)
        .bind(&integration.webhook_url)
        .bind(integration.notifications.war_create)
        .bind(integration.notifications.war_cancel)
        .bind(integration.notifications.war_end)
        .bind(integration.reminder_minutes)
        .bind(role_map)
        .bind(member_cache)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(guild_not_found(guild_id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        // Dependent rows cascade via foreign keys
        let result = sqlx::query("DELETE FROM guilds WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(guild_not_found(id));
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
        assert_send_sync::<PgGuildRepository>();
    }
}
