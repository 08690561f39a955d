//! PostgreSQL implementation of StatRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use warband_core::entities::WarStat;
use warband_core::error::DomainError;
use warband_core::traits::{RepoResult, StatRepository, StatRevisionPlan};
use warband_core::value_objects::Snowflake;

use crate::models::WarStatModel;

use super::error::map_db_error;
use super::war::{
    apply_guild_delta, insert_activity, insert_attendance, insert_member_aggregate,
    insert_player_aggregate, insert_stat, latest_member_row, latest_player_row,
    lock_profile_aggregates,
};

const STAT_COLUMNS: &str = "id, attendance_id, command_post, fort, gate, help, mount, \
     placed_objects, guild_master, officer, member, death, siege_weapons";

/// PostgreSQL implementation of StatRepository
#[derive(Clone)]
pub struct PgStatRepository {
    pool: PgPool,
}

impl PgStatRepository {
    /// Create a new PgStatRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatRepository for PgStatRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<WarStat>> {
        let result = sqlx::query_as::<_, WarStatModel>(&format!(
            "SELECT {STAT_COLUMNS} FROM war_stats WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(WarStat::from))
    }

    #[instrument(skip(self))]
    async fn find_by_attendance(&self, attendance_id: Snowflake) -> RepoResult<Option<WarStat>> {
        let result = sqlx::query_as::<_, WarStatModel>(&format!(
            "SELECT {STAT_COLUMNS} FROM war_stats WHERE attendance_id = $1"
        ))
        .bind(attendance_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(WarStat::from))
    }

    #[instrument(skip(self))]
    async fn find_by_war(&self, war_id: Snowflake) -> RepoResult<Vec<WarStat>> {
        let results = sqlx::query_as::<_, WarStatModel>(
            r"
            SELECT ws.id, ws.attendance_id, ws.command_post, ws.fort, ws.gate, ws.help,
                ws.mount, ws.placed_objects, ws.guild_master, ws.officer, ws.member,
                ws.death, ws.siege_weapons
            FROM war_stats ws
            JOIN war_attendances wa ON wa.id = ws.attendance_id
            WHERE wa.war_id = $1
            ORDER BY ws.id
            ",
        )
        .bind(war_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(WarStat::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_guild_profile(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
    ) -> RepoResult<Vec<WarStat>> {
        let results = sqlx::query_as::<_, WarStatModel>(
            r"
            SELECT ws.id, ws.attendance_id, ws.command_post, ws.fort, ws.gate, ws.help,
                ws.mount, ws.placed_objects, ws.guild_master, ws.officer, ws.member,
                ws.death, ws.siege_weapons
            FROM war_stats ws
            JOIN war_attendances wa ON wa.id = ws.attendance_id
            JOIN wars w ON w.id = wa.war_id
            WHERE w.guild_id = $1 AND wa.user_profile_id = $2
            ORDER BY ws.id
            ",
        )
        .bind(guild_id.into_inner())
        .bind(profile_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(WarStat::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_profile(&self, profile_id: Snowflake) -> RepoResult<Vec<WarStat>> {
        let results = sqlx::query_as::<_, WarStatModel>(
            r"
            SELECT ws.id, ws.attendance_id, ws.command_post, ws.fort, ws.gate, ws.help,
                ws.mount, ws.placed_objects, ws.guild_master, ws.officer, ws.member,
                ws.death, ws.siege_weapons
            FROM war_stats ws
            JOIN war_attendances wa ON wa.id = ws.attendance_id
            WHERE wa.user_profile_id = $1
            ORDER BY ws.id
            ",
        )
        .bind(profile_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(WarStat::from).collect())
    }

    #[instrument(skip(self, plan), fields(war_id = %plan.war_id, guild_id = %plan.guild_id,
        updates = plan.stat_updates.len(), inserts = plan.stat_inserts.len(),
        deletes = plan.stat_deletes.len()))]
    async fn apply_revision(&self, plan: &StatRevisionPlan) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // Revisions only apply to finished wars; guard against the war
        // having been deleted or reopened since the plan was built
        let finished = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM wars WHERE id = $1 AND outcome IS NOT NULL)",
        )
        .bind(plan.war_id.into_inner())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if !finished {
            return Err(DomainError::WarNotFound(plan.war_id));
        }

        if let Some((_, to)) = plan.outcome_change {
            sqlx::query("UPDATE wars SET outcome = $2 WHERE id = $1")
                .bind(plan.war_id.into_inner())
                .bind(to.as_i16())
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
        }
        if let Some(note) = &plan.note {
            sqlx::query("UPDATE wars SET note = $2 WHERE id = $1")
                .bind(plan.war_id.into_inner())
                .bind(note)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
        }

        // Walk-in rows go in before the stat lines that reference them
        for row in &plan.attendance_inserts {
            insert_attendance(&mut tx, row).await?;
        }

        for stat in &plan.stat_updates {
            sqlx::query(
                r"
                UPDATE war_stats SET command_post = $2, fort = $3, gate = $4, help = $5,
                    mount = $6, placed_objects = $7, guild_master = $8, officer = $9,
                    member = $10, death = $11, siege_weapons = $12
                WHERE id = $1
                ",
            )
            .bind(stat.id.into_inner())
            .bind(stat.counters.command_post)
            .bind(stat.counters.fort)
            .bind(stat.counters.gate)
            .bind(stat.counters.help)
            .bind(stat.counters.mount)
            .bind(stat.counters.placed_objects)
            .bind(stat.counters.guild_master)
            .bind(stat.counters.officer)
            .bind(stat.counters.member)
            .bind(stat.counters.death)
            .bind(stat.counters.siege_weapons)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        for stat in &plan.stat_inserts {
            insert_stat(&mut tx, stat).await?;
        }

        if !plan.stat_deletes.is_empty() {
            let ids: Vec<i64> = plan.stat_deletes.iter().map(|id| id.into_inner()).collect();
            sqlx::query("DELETE FROM war_stats WHERE id = ANY($1)")
                .bind(&ids)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
        }

        for update in &plan.status_updates {
            if update.attendance_ids.is_empty() {
                continue;
            }
            let ids: Vec<i64> = update
                .attendance_ids
                .iter()
                .map(|id| id.into_inner())
                .collect();
            sqlx::query("UPDATE war_attendances SET status = $1 WHERE id = ANY($2)")
                .bind(update.status.as_i16())
                .bind(&ids)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
        }

        // Replace each affected profile's aggregate history wholesale. The
        // histories were replayed at planning time; lock the profile and
        // verify the latest stored row still matches what the replay started
        // from, otherwise a concurrent finalization slipped in and the
        // rebuild is stale. Rebuilds arrive sorted by profile id so lock
        // order is fixed.
        for rebuild in &plan.member_rebuilds {
            lock_profile_aggregates(&mut tx, rebuild.user_profile_id).await?;
            let latest = latest_member_row(&mut tx, rebuild.guild_id, rebuild.user_profile_id)
                .await?;
            if latest != rebuild.expected_latest.map(Snowflake::into_inner) {
                return Err(DomainError::AggregateConflict(rebuild.user_profile_id));
            }
            sqlx::query(
                "DELETE FROM guild_member_aggregates WHERE guild_id = $1 AND user_profile_id = $2",
            )
            .bind(rebuild.guild_id.into_inner())
            .bind(rebuild.user_profile_id.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
            for row in &rebuild.rows {
                insert_member_aggregate(&mut tx, row).await?;
            }
        }

        for rebuild in &plan.player_rebuilds {
            lock_profile_aggregates(&mut tx, rebuild.user_profile_id).await?;
            let latest = latest_player_row(&mut tx, rebuild.user_profile_id).await?;
            if latest != rebuild.expected_latest.map(Snowflake::into_inner) {
                return Err(DomainError::AggregateConflict(rebuild.user_profile_id));
            }
            sqlx::query("DELETE FROM player_aggregates WHERE user_profile_id = $1")
                .bind(rebuild.user_profile_id.into_inner())
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
            for row in &rebuild.rows {
                insert_player_aggregate(&mut tx, row).await?;
            }
        }

        // Outcome tallies move only when the outcome itself changed
        match plan.outcome_change {
            Some((from, to)) => {
                apply_guild_delta(&mut tx, plan.guild_id, &plan.guild_delta, Some(to)).await?;
                // Decrement the previous outcome tally
                let column = match from {
                    warband_core::entities::WarOutcome::Win => "wars_won",
                    warband_core::entities::WarOutcome::Loss => "wars_lost",
                    warband_core::entities::WarOutcome::Stalemate => "wars_stalemated",
                };
                sqlx::query(&format!(
                    "UPDATE guild_aggregates SET {column} = {column} - 1 WHERE guild_id = $1"
                ))
                .bind(plan.guild_id.into_inner())
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
            }
            None => {
                apply_guild_delta(&mut tx, plan.guild_id, &plan.guild_delta, None).await?;
            }
        }

        insert_activity(&mut tx, &plan.activity).await?;

        tx.commit().await.map_err(map_db_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgStatRepository>();
    }
}
