//! PostgreSQL implementation of MemberRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use warband_core::entities::GuildMember;
use warband_core::traits::{MemberRepository, RepoResult, RosterSyncPlan};
use warband_core::value_objects::Snowflake;

use crate::models::GuildMemberModel;

use super::error::{map_db_error, map_unique_violation, member_not_found};

/// PostgreSQL implementation of MemberRepository
#[derive(Clone)]
pub struct PgMemberRepository {
    pool: PgPool,
}

impl PgMemberRepository {
    /// Create a new PgMemberRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberRepository for PgMemberRepository {
    #[instrument(skip(self))]
    async fn find(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
    ) -> RepoResult<Option<GuildMember>> {
        let result = sqlx::query_as::<_, GuildMemberModel>(
            r"
            SELECT guild_id, user_profile_id, role_id, joined_at
            FROM guild_members
            WHERE guild_id = $1 AND user_profile_id = $2
            ",
        )
        .bind(guild_id.into_inner())
        .bind(profile_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(GuildMember::from))
    }

    #[instrument(skip(self))]
    async fn find_by_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<GuildMember>> {
        let results = sqlx::query_as::<_, GuildMemberModel>(
            r"
            SELECT guild_id, user_profile_id, role_id, joined_at
            FROM guild_members
            WHERE guild_id = $1
            ORDER BY joined_at
            ",
        )
        .bind(guild_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(GuildMember::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_profile(&self, profile_id: Snowflake) -> RepoResult<Vec<GuildMember>> {
        let results = sqlx::query_as::<_, GuildMemberModel>(
            r"
            SELECT guild_id, user_profile_id, role_id, joined_at
            FROM guild_members
            WHERE user_profile_id = $1
            ORDER BY joined_at
            ",
        )
        .bind(profile_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(GuildMember::from).collect())
    }

    #[instrument(skip(self, member))]
    async fn create(&self, member: &GuildMember) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO guild_members (guild_id, user_profile_id, role_id, joined_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(member.guild_id.into_inner())
        .bind(member.user_profile_id.into_inner())
        .bind(member.role_id.into_inner())
        .bind(member.joined_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || warband_core::DomainError::AlreadyMember))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_role(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
        role_id: Snowflake,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE guild_members SET role_id = $3
            WHERE guild_id = $1 AND user_profile_id = $2
            ",
        )
        .bind(guild_id.into_inner())
        .bind(profile_id.into_inner())
        .bind(role_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(member_not_found());
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, guild_id: Snowflake, profile_id: Snowflake) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            DELETE FROM guild_members WHERE guild_id = $1 AND user_profile_id = $2
            ",
        )
        .bind(guild_id.into_inner())
        .bind(profile_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(member_not_found());
        }

        Ok(())
    }

    #[instrument(skip(self, plan), fields(guild_id = %plan.guild_id,
        added = plan.add.len(), updated = plan.update_roles.len(),
        removed = plan.remove.len()))]
    async fn apply_sync(&self, plan: &RosterSyncPlan) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        for member in &plan.add {
            sqlx::query(
                r"
                INSERT INTO guild_members (guild_id, user_profile_id, role_id, joined_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (guild_id, user_profile_id) DO UPDATE SET role_id = EXCLUDED.role_id
                ",
            )
            .bind(member.guild_id.into_inner())
            .bind(member.user_profile_id.into_inner())
            .bind(member.role_id.into_inner())
            .bind(member.joined_at)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        for (profile_id, role_id) in &plan.update_roles {
            sqlx::query(
                r"
                UPDATE guild_members SET role_id = $3
                WHERE guild_id = $1 AND user_profile_id = $2
                ",
            )
            .bind(plan.guild_id.into_inner())
            .bind(profile_id.into_inner())
            .bind(role_id.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        if !plan.remove.is_empty() {
            let ids: Vec<i64> = plan.remove.iter().map(|id| id.into_inner()).collect();
            sqlx::query(
                r"
                DELETE FROM guild_members
                WHERE guild_id = $1 AND user_profile_id = ANY($2)
                ",
            )
            .bind(plan.guild_id.into_inner())
            .bind(&ids)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        let member_cache = serde_json::to_value(&plan.member_cache)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));
        sqlx::query("UPDATE guilds SET member_cache = $2 WHERE id = $1")
            .bind(plan.guild_id.into_inner())
            .bind(member_cache)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgMemberRepository>();
    }
}
