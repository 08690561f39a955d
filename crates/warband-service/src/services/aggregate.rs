//! Aggregate service
//!
//! Reads and rebuilds the three aggregate scopes: guild, guild member, and
//! player. Finalization appends aggregate rows incrementally; this service
//! owns the full recomputation path used after revisions and for members
//! added by roster sync.

use std::collections::HashMap;

use tracing::{info, instrument};

use warband_core::entities::{
    AttendanceClassification, GuildAggregate, GuildMemberAggregate, PlayerAggregate, StatCounters,
    WarAttendance, WarOutcome,
};
use warband_core::value_objects::{Snowflake, SnowflakeGenerator};

use crate::dto::{GuildAggregateResponse, MemberAggregateResponse, PlayerAggregateResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Aggregate service
pub struct AggregateService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AggregateService<'a> {
    /// Create a new AggregateService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Guild-wide totals
    #[instrument(skip(self))]
    pub async fn get_guild_aggregate(
        &self,
        guild_id: Snowflake,
    ) -> ServiceResult<GuildAggregateResponse> {
        let aggregate = self
            .ctx
            .aggregate_repo()
            .find_guild(guild_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Guild aggregate", guild_id.to_string()))?;
        Ok(GuildAggregateResponse::from(&aggregate))
    }

    /// Current totals for one member of a guild
    #[instrument(skip(self))]
    pub async fn get_member_aggregate(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
    ) -> ServiceResult<MemberAggregateResponse> {
        let aggregate = self
            .ctx
            .aggregate_repo()
            .find_member_latest(guild_id, profile_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Member aggregate", profile_id.to_string()))?;
        Ok(MemberAggregateResponse::from(&aggregate))
    }

    /// Current totals for every member of a guild
    #[instrument(skip(self))]
    pub async fn get_member_aggregates(
        &self,
        guild_id: Snowflake,
    ) -> ServiceResult<Vec<MemberAggregateResponse>> {
        let aggregates = self.ctx.aggregate_repo().find_members_latest(guild_id).await?;
        Ok(aggregates.iter().map(MemberAggregateResponse::from).collect())
    }

    /// Current cross-guild totals for a player
    #[instrument(skip(self))]
    pub async fn get_player_aggregate(
        &self,
        profile_id: Snowflake,
    ) -> ServiceResult<PlayerAggregateResponse> {
        let aggregate = self
            .ctx
            .aggregate_repo()
            .find_player_latest(profile_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Player aggregate", profile_id.to_string()))?;
        Ok(PlayerAggregateResponse::from(&aggregate))
    }

    /// Rebuild one member's aggregate history from their finalized wars
    #[instrument(skip(self))]
    pub async fn recalculate_member(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
    ) -> ServiceResult<()> {
        let attendance = self
            .ctx
            .attendance_repo()
            .find_finalized_by_guild_profile(guild_id, profile_id)
            .await?;
        let stats = self.stats_by_attendance(
            self.ctx
                .stat_repo()
                .find_by_guild_profile(guild_id, profile_id)
                .await?,
        );

        let base = GuildMemberAggregate::new(self.ctx.generate_id(), guild_id, profile_id);
        let rows = member_history(&base, &attendance, &stats, self.ctx.snowflake_generator());

        self.ctx
            .aggregate_repo()
            .replace_member_rows(guild_id, profile_id, &rows)
            .await?;

        info!(guild_id = %guild_id, profile_id = %profile_id, wars = rows.len(), "Member aggregate rebuilt");

        Ok(())
    }

    /// Rebuild one player's cross-guild aggregate history
    #[instrument(skip(self))]
    pub async fn recalculate_player(&self, profile_id: Snowflake) -> ServiceResult<()> {
        let attendance = self
            .ctx
            .attendance_repo()
            .find_finalized_by_profile(profile_id)
            .await?;
        let stats =
            self.stats_by_attendance(self.ctx.stat_repo().find_by_profile(profile_id).await?);

        let base = PlayerAggregate::new(self.ctx.generate_id(), profile_id);
        let rows = player_history(&base, &attendance, &stats, self.ctx.snowflake_generator());

        self.ctx
            .aggregate_repo()
            .replace_player_rows(profile_id, &rows)
            .await?;

        Ok(())
    }

    /// Rebuild the guild row by summing the latest member rows and counting
    /// war outcomes
    #[instrument(skip(self))]
    pub async fn recalculate_guild(&self, guild_id: Snowflake) -> ServiceResult<()> {
        let existing = self
            .ctx
            .aggregate_repo()
            .find_guild(guild_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Guild aggregate", guild_id.to_string()))?;

        let members = self.ctx.aggregate_repo().find_members_latest(guild_id).await?;
        let mut totals = StatCounters::ZERO;
        for member in &members {
            totals.add(&member.totals);
        }

        let wars = self.ctx.war_repo().find_by_guild(guild_id, 1000).await?;
        let mut aggregate = GuildAggregate {
            id: existing.id,
            guild_id,
            totals,
            wars_won: 0,
            wars_lost: 0,
            wars_stalemated: 0,
        };
        for war in &wars {
            match war.outcome {
                Some(WarOutcome::Win) => aggregate.wars_won += 1,
                Some(WarOutcome::Loss) => aggregate.wars_lost += 1,
                Some(WarOutcome::Stalemate) => aggregate.wars_stalemated += 1,
                None => {}
            }
        }

        self.ctx.aggregate_repo().replace_guild(&aggregate).await?;

        info!(guild_id = %guild_id, wars = aggregate.wars_finished(), "Guild aggregate rebuilt");

        Ok(())
    }

    /// Create a zeroed member aggregate row when none exists yet
    #[instrument(skip(self))]
    pub async fn ensure_member(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
    ) -> ServiceResult<()> {
        if self
            .ctx
            .aggregate_repo()
            .find_member_latest(guild_id, profile_id)
            .await?
            .is_none()
        {
            let base = GuildMemberAggregate::new(self.ctx.generate_id(), guild_id, profile_id);
            self.ctx
                .aggregate_repo()
                .replace_member_rows(guild_id, profile_id, &[base])
                .await?;
        }
        Ok(())
    }

    /// Create a zeroed player aggregate row when none exists yet
    #[instrument(skip(self))]
    pub async fn ensure_player(&self, profile_id: Snowflake) -> ServiceResult<()> {
        if self
            .ctx
            .aggregate_repo()
            .find_player_latest(profile_id)
            .await?
            .is_none()
        {
            let base = PlayerAggregate::new(self.ctx.generate_id(), profile_id);
            self.ctx
                .aggregate_repo()
                .replace_player_rows(profile_id, &[base])
                .await?;
        }
        Ok(())
    }

    /// Rebuild everything for a guild: each member, their player rows, then
    /// the guild row
    #[instrument(skip(self))]
    pub async fn recalculate_all(&self, guild_id: Snowflake) -> ServiceResult<()> {
        let members = self.ctx.member_repo().find_by_guild(guild_id).await?;
        for member in &members {
            self.recalculate_member(guild_id, member.user_profile_id).await?;
            self.recalculate_player(member.user_profile_id).await?;
        }
        self.recalculate_guild(guild_id).await?;
        Ok(())
    }

    fn stats_by_attendance(
        &self,
        stats: Vec<warband_core::entities::WarStat>,
    ) -> HashMap<Snowflake, StatCounters> {
        stats
            .into_iter()
            .map(|s| (s.attendance_id, s.counters))
            .collect()
    }
}

/// Replay finalized attendance rows (ordered by war) into versioned member
/// aggregate rows
pub(crate) fn member_history(
    base: &GuildMemberAggregate,
    attendance: &[WarAttendance],
    stats: &HashMap<Snowflake, StatCounters>,
    ids: &SnowflakeGenerator,
) -> Vec<GuildMemberAggregate> {
    let mut rows = Vec::with_capacity(attendance.len());
    let mut current = base.clone();
    for row in attendance {
        let classification = AttendanceClassification::from_status(row.status);
        current = current.clone_and_increment(
            ids.generate(),
            row.war_id,
            classification,
            stats.get(&row.id),
        );
        rows.push(current.clone());
    }
    rows
}

pub(crate) fn player_history(
    base: &PlayerAggregate,
    attendance: &[WarAttendance],
    stats: &HashMap<Snowflake, StatCounters>,
    ids: &SnowflakeGenerator,
) -> Vec<PlayerAggregate> {
    let mut rows = Vec::with_capacity(attendance.len());
    let mut current = base.clone();
    for row in attendance {
        let classification = AttendanceClassification::from_status(row.status);
        current = current.clone_and_increment(
            ids.generate(),
            row.war_id,
            classification,
            stats.get(&row.id),
        );
        rows.push(current.clone());
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use warband_core::entities::AttendanceStatus;

    fn row(id: i64, war_id: i64, status: AttendanceStatus) -> WarAttendance {
        WarAttendance::new(
            Snowflake::new(id),
            Snowflake::new(war_id),
            Snowflake::new(77),
            status,
        )
    }

    #[test]
    fn test_member_history_accumulates() {
        let base =
            GuildMemberAggregate::new(Snowflake::new(0), Snowflake::new(1), Snowflake::new(77));
        let attendance = vec![
            row(10, 100, AttendanceStatus::Attending),
            row(11, 101, AttendanceStatus::Reneged),
            row(12, 102, AttendanceStatus::Late),
        ];
        let mut stats = HashMap::new();
        stats.insert(
            Snowflake::new(10),
            StatCounters {
                member: 5,
                death: 1,
                ..StatCounters::ZERO
            },
        );
        stats.insert(
            Snowflake::new(12),
            StatCounters {
                member: 3,
                death: 3,
                ..StatCounters::ZERO
            },
        );

        let rows = member_history(&base, &attendance, &stats, &SnowflakeGenerator::new(1));
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].war_id, Snowflake::new(100));
        assert_eq!(rows[0].attendance.wars_attended, 1);
        assert_eq!(rows[0].totals.member, 5);

        assert_eq!(rows[1].attendance.wars_reneged, 1);
        assert_eq!(rows[1].totals.member, 5);

        assert_eq!(rows[2].attendance.wars_attended, 2);
        assert_eq!(rows[2].totals.member, 8);
        assert_eq!(rows[2].total_kills, 8);
        assert_eq!(rows[2].kdr, 2.0);
    }

    #[test]
    fn test_player_history_empty_roster() {
        let base = PlayerAggregate::new(Snowflake::new(0), Snowflake::new(77));
        let rows = player_history(&base, &[], &HashMap::new(), &SnowflakeGenerator::new(1));
        assert!(rows.is_empty());
    }
}
