//! PostgreSQL implementation of ActivityRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use warband_core::entities::Activity;
use warband_core::traits::{ActivityRepository, RepoResult};
use warband_core::value_objects::Snowflake;

use crate::mappers::activity_from_model;
use crate::models::ActivityModel;

use super::error::map_db_error;

/// PostgreSQL implementation of ActivityRepository
#[derive(Clone)]
pub struct PgActivityRepository {
    pool: PgPool,
}

impl PgActivityRepository {
    /// Create a new PgActivityRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityRepository for PgActivityRepository {
    #[instrument(skip(self, activity))]
    async fn create(&self, activity: &Activity) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO activities (id, guild_id, actor_profile_id, kind, detail, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(activity.id.into_inner())
        .bind(activity.guild_id.into_inner())
        .bind(activity.actor_profile_id.map(Snowflake::into_inner))
        .bind(activity.kind.as_str())
        .bind(&activity.detail)
        .bind(activity.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_guild(&self, guild_id: Snowflake, limit: i64) -> RepoResult<Vec<Activity>> {
        let limit = limit.clamp(1, 500);
        let results = sqlx::query_as::<_, ActivityModel>(
            r"
            SELECT id, guild_id, actor_profile_id, kind, detail, created_at
            FROM activities
            WHERE guild_id = $1
            ORDER BY id DESC
            LIMIT $2
            ",
        )
        .bind(guild_id.into_inner())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(activity_from_model).collect()
    }
}
