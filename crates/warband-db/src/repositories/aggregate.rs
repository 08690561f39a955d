//! PostgreSQL implementation of AggregateRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use warband_core::entities::{GuildAggregate, GuildMemberAggregate, PlayerAggregate};
use warband_core::traits::{AggregateRepository, RepoResult};
use warband_core::value_objects::Snowflake;

use crate::models::{GuildAggregateModel, MemberAggregateModel, PlayerAggregateModel};

use super::error::map_db_error;

const GUILD_AGG_COLUMNS: &str = "id, guild_id, command_post, fort, gate, help, mount, \
     placed_objects, guild_master, officer, member, death, siege_weapons, \
     wars_won, wars_lost, wars_stalemated";

const MEMBER_AGG_COLUMNS: &str = "id, guild_id, user_profile_id, war_id, \
     wars_attended, wars_unavailable, wars_missed, wars_reneged, \
     command_post, fort, gate, help, mount, placed_objects, \
     guild_master, officer, member, death, siege_weapons, total_kills, kdr";

const PLAYER_AGG_COLUMNS: &str = "id, user_profile_id, war_id, \
     wars_attended, wars_unavailable, wars_missed, wars_reneged, \
     command_post, fort, gate, help, mount, placed_objects, \
     guild_master, officer, member, death, siege_weapons, total_kills, kdr";

/// PostgreSQL implementation of AggregateRepository
#[derive(Clone)]
pub struct PgAggregateRepository {
    pool: PgPool,
}

impl PgAggregateRepository {
    /// Create a new PgAggregateRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AggregateRepository for PgAggregateRepository {
    #[instrument(skip(self))]
    async fn find_guild(&self, guild_id: Snowflake) -> RepoResult<Option<GuildAggregate>> {
        let result = sqlx::query_as::<_, GuildAggregateModel>(&format!(
            "SELECT {GUILD_AGG_COLUMNS} FROM guild_aggregates WHERE guild_id = $1"
        ))
        .bind(guild_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(GuildAggregate::from))
    }

    #[instrument(skip(self, aggregate))]
    async fn create_guild(&self, aggregate: &GuildAggregate) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO guild_aggregates (id, guild_id, command_post, fort, gate, help, mount,
                placed_objects, guild_master, officer, member, death, siege_weapons,
                wars_won, wars_lost, wars_stalemated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ",
        )
        .bind(aggregate.id.into_inner())
        .bind(aggregate.guild_id.into_inner())
        .bind(aggregate.totals.command_post)
        .bind(aggregate.totals.fort)
        .bind(aggregate.totals.gate)
        .bind(aggregate.totals.help)
        .bind(aggregate.totals.mount)
        .bind(aggregate.totals.placed_objects)
        .bind(aggregate.totals.guild_master)
        .bind(aggregate.totals.officer)
        .bind(aggregate.totals.member)
        .bind(aggregate.totals.death)
        .bind(aggregate.totals.siege_weapons)
        .bind(aggregate.wars_won)
        .bind(aggregate.wars_lost)
        .bind(aggregate.wars_stalemated)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_member_latest(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
    ) -> RepoResult<Option<GuildMemberAggregate>> {
        let result = sqlx::query_as::<_, MemberAggregateModel>(&format!(
            r"
            SELECT {MEMBER_AGG_COLUMNS} FROM guild_member_aggregates
            WHERE guild_id = $1 AND user_profile_id = $2
            ORDER BY id DESC
            LIMIT 1
            "
        ))
        .bind(guild_id.into_inner())
        .bind(profile_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(GuildMemberAggregate::from))
    }

    #[instrument(skip(self))]
    async fn find_members_latest(
        &self,
        guild_id: Snowflake,
    ) -> RepoResult<Vec<GuildMemberAggregate>> {
        let results = sqlx::query_as::<_, MemberAggregateModel>(&format!(
            r"
            SELECT DISTINCT ON (user_profile_id) {MEMBER_AGG_COLUMNS}
            FROM guild_member_aggregates
            WHERE guild_id = $1
            ORDER BY user_profile_id, id DESC
            "
        ))
        .bind(guild_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(GuildMemberAggregate::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_player_latest(
        &self,
        profile_id: Snowflake,
    ) -> RepoResult<Option<PlayerAggregate>> {
        let result = sqlx::query_as::<_, PlayerAggregateModel>(&format!(
            r"
            SELECT {PLAYER_AGG_COLUMNS} FROM player_aggregates
            WHERE user_profile_id = $1
            ORDER BY id DESC
            LIMIT 1
            "
        ))
        .bind(profile_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(PlayerAggregate::from))
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn replace_member_rows(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
        rows: &[GuildMemberAggregate],
    ) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            "DELETE FROM guild_member_aggregates WHERE guild_id = $1 AND user_profile_id = $2",
        )
        .bind(guild_id.into_inner())
        .bind(profile_id.into_inner())
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        for row in rows {
            sqlx::query(
                r"
                INSERT INTO guild_member_aggregates (id, guild_id, user_profile_id, war_id,
                    wars_attended, wars_unavailable, wars_missed, wars_reneged,
                    command_post, fort, gate, help, mount, placed_objects,
                    guild_master, officer, member, death, siege_weapons, total_kills, kdr)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21)
                ",
            )
            .bind(row.id.into_inner())
            .bind(row.guild_id.into_inner())
            .bind(row.user_profile_id.into_inner())
            .bind(row.war_id.into_inner())
            .bind(row.attendance.wars_attended)
            .bind(row.attendance.wars_unavailable)
            .bind(row.attendance.wars_missed)
            .bind(row.attendance.wars_reneged)
            .bind(row.totals.command_post)
            .bind(row.totals.fort)
            .bind(row.totals.gate)
            .bind(row.totals.help)
            .bind(row.totals.mount)
            .bind(row.totals.placed_objects)
            .bind(row.totals.guild_master)
            .bind(row.totals.officer)
            .bind(row.totals.member)
            .bind(row.totals.death)
            .bind(row.totals.siege_weapons)
            .bind(row.total_kills)
            .bind(row.kdr)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn replace_player_rows(
        &self,
        profile_id: Snowflake,
        rows: &[PlayerAggregate],
    ) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query("DELETE FROM player_aggregates WHERE user_profile_id = $1")
            .bind(profile_id.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        for row in rows {
            sqlx::query(
                r"
                INSERT INTO player_aggregates (id, user_profile_id, war_id,
                    wars_attended, wars_unavailable, wars_missed, wars_reneged,
                    command_post, fort, gate, help, mount, placed_objects,
                    guild_master, officer, member, death, siege_weapons, total_kills, kdr)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20)
                ",
            )
            .bind(row.id.into_inner())
            .bind(row.user_profile_id.into_inner())
            .bind(row.war_id.into_inner())
            .bind(row.attendance.wars_attended)
            .bind(row.attendance.wars_unavailable)
            .bind(row.attendance.wars_missed)
            .bind(row.attendance.wars_reneged)
            .bind(row.totals.command_post)
            .bind(row.totals.fort)
            .bind(row.totals.gate)
            .bind(row.totals.help)
            .bind(row.totals.mount)
            .bind(row.totals.placed_objects)
            .bind(row.totals.guild_master)
            .bind(row.totals.officer)
            .bind(row.totals.member)
            .bind(row.totals.death)
            .bind(row.totals.siege_weapons)
            .bind(row.total_kills)
            .bind(row.kdr)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)
    }

    #[instrument(skip(self, aggregate))]
    async fn replace_guild(&self, aggregate: &GuildAggregate) -> RepoResult<()> {
        sqlx::query(
            r"
            UPDATE guild_aggregates SET
                command_post = $2, fort = $3, gate = $4, help = $5, mount = $6,
                placed_objects = $7, guild_master = $8, officer = $9, member = $10,
                death = $11, siege_weapons = $12,
                wars_won = $13, wars_lost = $14, wars_stalemated = $15
            WHERE guild_id = $1
            ",
        )
        .bind(aggregate.guild_id.into_inner())
        .bind(aggregate.totals.command_post)
        .bind(aggregate.totals.fort)
        .bind(aggregate.totals.gate)
        .bind(aggregate.totals.help)
        .bind(aggregate.totals.mount)
        .bind(aggregate.totals.placed_objects)
        .bind(aggregate.totals.guild_master)
        .bind(aggregate.totals.officer)
        .bind(aggregate.totals.member)
        .bind(aggregate.totals.death)
        .bind(aggregate.totals.siege_weapons)
        .bind(aggregate.wars_won)
        .bind(aggregate.wars_lost)
        .bind(aggregate.wars_stalemated)
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
        assert_send_sync::<PgAggregateRepository>();
    }
}
