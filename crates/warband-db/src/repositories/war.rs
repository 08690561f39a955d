//! PostgreSQL implementation of WarRepository
//!
//! Besides CRUD this owns the finalization transaction: the outcome write is
//! compare-and-set on a pending war, and the guild aggregate row is locked
//! before its counters move, so two concurrent submissions cannot both land.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use warband_core::entities::{
    GuildMemberAggregate, PlayerAggregate, War, WarAttendance, WarOutcome, WarStat,
};
use warband_core::error::DomainError;
use warband_core::traits::{FinalizePlan, RepoResult, WarRepository};
use warband_core::value_objects::Snowflake;

use crate::mappers::war_from_model;
use crate::models::WarModel;

use super::error::{map_db_error, map_unique_violation, war_not_found};

const WAR_COLUMNS: &str =
    "id, guild_id, date, node_name, node_tier, outcome, note, reminder_sent";

/// PostgreSQL implementation of WarRepository
#[derive(Clone)]
pub struct PgWarRepository {
    pool: PgPool,
}

impl PgWarRepository {
    /// Create a new PgWarRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(super) async fn insert_stat(
    tx: &mut Transaction<'_, Postgres>,
    stat: &WarStat,
) -> RepoResult<()> {
    sqlx::query(
        r"
        INSERT INTO war_stats (id, attendance_id, command_post, fort, gate, help, mount,
            placed_objects, guild_master, officer, member, death, siege_weapons)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ",
    )
    .bind(stat.id.into_inner())
    .bind(stat.attendance_id.into_inner())
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
    .execute(&mut **tx)
    .await
    .map_err(map_db_error)?;

    Ok(())
}

pub(super) async fn insert_attendance(
    tx: &mut Transaction<'_, Postgres>,
    row: &WarAttendance,
) -> RepoResult<()> {
    sqlx::query(
        r"
        INSERT INTO war_attendances (id, war_id, user_profile_id, character_id, status, note)
        VALUES ($1, $2, $3, $4, $5, $6)
        ",
    )
    .bind(row.id.into_inner())
    .bind(row.war_id.into_inner())
    .bind(row.user_profile_id.into_inner())
    .bind(row.character_id.map(Snowflake::into_inner))
    .bind(row.status.as_i16())
    .bind(&row.note)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_unique_violation(e, || DomainError::AttendanceExists))?;

    Ok(())
}

/// Serialize aggregate writes for one profile within this transaction
pub(super) async fn lock_profile_aggregates(
    tx: &mut Transaction<'_, Postgres>,
    profile_id: Snowflake,
) -> RepoResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(profile_id.into_inner())
        .execute(&mut **tx)
        .await
        .map_err(map_db_error)?;
    Ok(())
}

pub(super) async fn latest_member_row(
    tx: &mut Transaction<'_, Postgres>,
    guild_id: Snowflake,
    profile_id: Snowflake,
) -> RepoResult<Option<i64>> {
    sqlx::query_scalar::<_, Option<i64>>(
        "SELECT MAX(id) FROM guild_member_aggregates WHERE guild_id = $1 AND user_profile_id = $2",
    )
    .bind(guild_id.into_inner())
    .bind(profile_id.into_inner())
    .fetch_one(&mut **tx)
    .await
    .map_err(map_db_error)
}

pub(super) async fn latest_player_row(
    tx: &mut Transaction<'_, Postgres>,
    profile_id: Snowflake,
) -> RepoResult<Option<i64>> {
    sqlx::query_scalar::<_, Option<i64>>(
        "SELECT MAX(id) FROM player_aggregates WHERE user_profile_id = $1",
    )
    .bind(profile_id.into_inner())
    .fetch_one(&mut **tx)
    .await
    .map_err(map_db_error)
}

pub(super) async fn insert_member_aggregate(
    tx: &mut Transaction<'_, Postgres>,
    row: &GuildMemberAggregate,
) -> RepoResult<()> {
    sqlx::query(
        r"
        INSERT INTO guild_member_aggregates (id, guild_id, user_profile_id, war_id,
            wars_attended, wars_unavailable, wars_missed, wars_reneged,
            command_post, fort, gate, help, mount, placed_objects,
            guild_master, officer, member, death, siege_weapons, total_kills, kdr)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
            $18, $19, $20, $21)
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
    .execute(&mut **tx)
    .await
    .map_err(map_db_error)?;

    Ok(())
}

pub(super) async fn insert_player_aggregate(
    tx: &mut Transaction<'_, Postgres>,
    row: &PlayerAggregate,
) -> RepoResult<()> {
    sqlx::query(
        r"
        INSERT INTO player_aggregates (id, user_profile_id, war_id,
            wars_attended, wars_unavailable, wars_missed, wars_reneged,
            command_post, fort, gate, help, mount, placed_objects,
            guild_master, officer, member, death, siege_weapons, total_kills, kdr)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
            $18, $19, $20)
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
    .execute(&mut **tx)
    .await
    .map_err(map_db_error)?;

    Ok(())
}

pub(super) async fn insert_activity(
    tx: &mut Transaction<'_, Postgres>,
    activity: &warband_core::entities::Activity,
) -> RepoResult<()> {
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
    .execute(&mut **tx)
    .await
    .map_err(map_db_error)?;

    Ok(())
}

/// Lock the guild aggregate row and fold in a counter delta plus an
/// optional outcome tally bump.
pub(super) async fn apply_guild_delta(
    tx: &mut Transaction<'_, Postgres>,
    guild_id: Snowflake,
    delta: &warband_core::entities::StatCounters,
    outcome: Option<WarOutcome>,
) -> RepoResult<()> {
    let locked = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM guild_aggregates WHERE guild_id = $1 FOR UPDATE",
    )
    .bind(guild_id.into_inner())
    .fetch_optional(&mut **tx)
    .await
    .map_err(map_db_error)?;

    if locked.is_none() {
        return Err(DomainError::AggregateMissing(guild_id));
    }

    sqlx::query(
        r"
        UPDATE guild_aggregates SET
            command_post = command_post + $2, fort = fort + $3, gate = gate + $4,
            help = help + $5, mount = mount + $6, placed_objects = placed_objects + $7,
            guild_master = guild_master + $8, officer = officer + $9, member = member + $10,
            death = death + $11, siege_weapons = siege_weapons + $12,
            wars_won = wars_won + $13, wars_lost = wars_lost + $14,
            wars_stalemated = wars_stalemated + $15
        WHERE guild_id = $1
        ",
    )
    .bind(guild_id.into_inner())
    .bind(delta.command_post)
    .bind(delta.fort)
    .bind(delta.gate)
    .bind(delta.help)
    .bind(delta.mount)
    .bind(delta.placed_objects)
    .bind(delta.guild_master)
    .bind(delta.officer)
    .bind(delta.member)
    .bind(delta.death)
    .bind(delta.siege_weapons)
    .bind(i32::from(outcome == Some(WarOutcome::Win)))
    .bind(i32::from(outcome == Some(WarOutcome::Loss)))
    .bind(i32::from(outcome == Some(WarOutcome::Stalemate)))
    .execute(&mut **tx)
    .await
    .map_err(map_db_error)?;

    Ok(())
}

#[async_trait]
impl WarRepository for PgWarRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<War>> {
        let result = sqlx::query_as::<_, WarModel>(&format!(
            "SELECT {WAR_COLUMNS} FROM wars WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(war_from_model).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_guild(&self, guild_id: Snowflake, limit: i64) -> RepoResult<Vec<War>> {
        let limit = limit.clamp(1, 1000);
        let results = sqlx::query_as::<_, WarModel>(&format!(
            "SELECT {WAR_COLUMNS} FROM wars WHERE guild_id = $1 ORDER BY date DESC LIMIT $2"
        ))
        .bind(guild_id.into_inner())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(war_from_model).collect()
    }

    #[instrument(skip(self))]
    async fn find_pending(&self, guild_id: Snowflake) -> RepoResult<Option<War>> {
        let result = sqlx::query_as::<_, WarModel>(&format!(
            r"
            SELECT {WAR_COLUMNS} FROM wars
            WHERE guild_id = $1 AND outcome IS NULL
            ORDER BY date DESC
            LIMIT 1
            "
        ))
        .bind(guild_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(war_from_model).transpose()
    }

    #[instrument(skip(self))]
    async fn find_latest_finished(&self, guild_id: Snowflake) -> RepoResult<Option<War>> {
        let result = sqlx::query_as::<_, WarModel>(&format!(
            r"
            SELECT {WAR_COLUMNS} FROM wars
            WHERE guild_id = $1 AND outcome IS NOT NULL
            ORDER BY date DESC
            LIMIT 1
            "
        ))
        .bind(guild_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(war_from_model).transpose()
    }

    #[instrument(skip(self))]
    async fn find_due_reminders(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> RepoResult<Vec<War>> {
        let results = sqlx::query_as::<_, WarModel>(&format!(
            r"
            SELECT {WAR_COLUMNS} FROM wars
            WHERE outcome IS NULL AND NOT reminder_sent AND date >= $1 AND date <= $2
            ORDER BY date
            "
        ))
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(war_from_model).collect()
    }

    #[instrument(skip(self, war))]
    async fn create(&self, war: &War) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO wars (id, guild_id, date, node_name, node_tier, outcome, note,
                reminder_sent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(war.id.into_inner())
        .bind(war.guild_id.into_inner())
        .bind(war.date)
        .bind(war.node.as_ref().map(|n| n.name.clone()))
        .bind(war.node.as_ref().map(|n| n.tier))
        .bind(war.outcome.map(WarOutcome::as_i16))
        .bind(&war.note)
        .bind(war.reminder_sent)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, war))]
    async fn update(&self, war: &War) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE wars SET date = $2, node_name = $3, node_tier = $4, note = $5
            WHERE id = $1
            ",
        )
        .bind(war.id.into_inner())
        .bind(war.date)
        .bind(war.node.as_ref().map(|n| n.name.clone()))
        .bind(war.node.as_ref().map(|n| n.tier))
        .bind(&war.note)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(war_not_found(war.id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_reminder_sent(&self, id: Snowflake) -> RepoResult<()> {
        let result = sqlx::query("UPDATE wars SET reminder_sent = TRUE WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(war_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        // Attendance, teams, slots, call signs, stats cascade via foreign keys
        let result = sqlx::query("DELETE FROM wars WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(war_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self, plan), fields(war_id = %plan.war_id, guild_id = %plan.guild_id,
        stats = plan.stats.len()))]
    async fn apply_finalize(&self, plan: &FinalizePlan) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // Compare-and-set on a pending war. Zero rows means another
        // submission already finalized it.
        let cas = sqlx::query(
            r"
            UPDATE wars SET outcome = $2, note = COALESCE($3, note)
            WHERE id = $1 AND outcome IS NULL
            ",
        )
        .bind(plan.war_id.into_inner())
        .bind(plan.outcome.as_i16())
        .bind(&plan.note)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if cas.rows_affected() == 0 {
            return Err(DomainError::WarAlreadyFinished);
        }

        // Walk-in rows go in first; the stat rows reference them
        for row in &plan.attendance_inserts {
            insert_attendance(&mut tx, row).await?;
        }

        for stat in &plan.stats {
            insert_stat(&mut tx, stat).await?;
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

        // Each attendee's new aggregate rows increment the latest stored row
        // at planning time. Lock the profile and re-check that the latest row
        // has not moved since; another guild finalizing a shared player's war
        // in between would otherwise have its increment overwritten.
        // Bases arrive sorted by profile id so lock order is fixed.
        for base in &plan.bases {
            lock_profile_aggregates(&mut tx, base.user_profile_id).await?;
            let member = latest_member_row(&mut tx, plan.guild_id, base.user_profile_id).await?;
            if member != base.member_base.map(Snowflake::into_inner) {
                return Err(DomainError::AggregateConflict(base.user_profile_id));
            }
            let player = latest_player_row(&mut tx, base.user_profile_id).await?;
            if player != base.player_base.map(Snowflake::into_inner) {
                return Err(DomainError::AggregateConflict(base.user_profile_id));
            }
        }

        for row in &plan.member_rows {
            insert_member_aggregate(&mut tx, row).await?;
        }
        for row in &plan.player_rows {
            insert_player_aggregate(&mut tx, row).await?;
        }

        apply_guild_delta(&mut tx, plan.guild_id, &plan.guild_delta, Some(plan.outcome)).await?;

        insert_activity(&mut tx, &plan.activity).await?;

        tx.commit().await.map_err(map_db_error)
    }
}
