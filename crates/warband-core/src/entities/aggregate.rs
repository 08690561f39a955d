//! Pre-computed attendance and stat aggregates
//!
//! Three scopes are maintained: per guild, per (guild, member), and per
//! player across all guilds. Finalizing a war folds its stats into all
//! three; the member and player rows are versioned by war so revisions can
//! be recomputed from a known-good base.

use serde::{Deserialize, Serialize};

use crate::entities::attendance::AttendanceStatus;
use crate::entities::stat::StatCounters;
use crate::value_objects::Snowflake;

/// How a finalized attendance row counts in the aggregate tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceClassification {
    Attended,
    Unavailable,
    Missed,
    Reneged,
}

impl AttendanceClassification {
    pub fn from_status(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Attending | AttendanceStatus::Late => Self::Attended,
            AttendanceStatus::NotAttending | AttendanceStatus::Undecided => Self::Unavailable,
            AttendanceStatus::NoShow => Self::Missed,
            AttendanceStatus::Reneged => Self::Reneged,
        }
    }
}

/// Attendance tallies shared by all three aggregate scopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttendanceCounts {
    pub wars_attended: i32,
    pub wars_unavailable: i32,
    pub wars_missed: i32,
    pub wars_reneged: i32,
}

impl AttendanceCounts {
    pub fn increment(&mut self, classification: AttendanceClassification) {
        match classification {
            AttendanceClassification::Attended => self.wars_attended += 1,
            AttendanceClassification::Unavailable => self.wars_unavailable += 1,
            AttendanceClassification::Missed => self.wars_missed += 1,
            AttendanceClassification::Reneged => self.wars_reneged += 1,
        }
    }
}

/// Guild-wide running totals, one row per guild
#[derive(Debug, Clone, PartialEq)]
pub struct GuildAggregate {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub totals: StatCounters,
    pub wars_won: i32,
    pub wars_lost: i32,
    pub wars_stalemated: i32,
}

impl GuildAggregate {
    pub fn new(id: Snowflake, guild_id: Snowflake) -> Self {
        Self {
            id,
            guild_id,
            totals: StatCounters::ZERO,
            wars_won: 0,
            wars_lost: 0,
            wars_stalemated: 0,
        }
    }

    #[inline]
    pub fn wars_finished(&self) -> i32 {
        self.wars_won + self.wars_lost + self.wars_stalemated
    }
}

/// Per-member totals within one guild, versioned by war
///
/// The latest row per (guild, profile) carries the current totals; the
/// `war_id` it references is the last war folded in.
#[derive(Debug, Clone, PartialEq)]
pub struct GuildMemberAggregate {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub user_profile_id: Snowflake,
    /// Last war folded into this row; zero for a fresh row
    pub war_id: Snowflake,
    pub attendance: AttendanceCounts,
    pub totals: StatCounters,
    pub total_kills: i32,
    pub kdr: f64,
}

impl GuildMemberAggregate {
    pub fn new(id: Snowflake, guild_id: Snowflake, user_profile_id: Snowflake) -> Self {
        Self {
            id,
            guild_id,
            user_profile_id,
            war_id: Snowflake::new(0),
            attendance: AttendanceCounts::default(),
            totals: StatCounters::ZERO,
            total_kills: 0,
            kdr: 0.0,
        }
    }

    /// New row based on this one with one more war folded in
    pub fn clone_and_increment(
        &self,
        new_id: Snowflake,
        war_id: Snowflake,
        classification: AttendanceClassification,
        stats: Option<&StatCounters>,
    ) -> Self {
        let mut next = self.clone();
        next.id = new_id;
        next.war_id = war_id;
        next.attendance.increment(classification);
        if let Some(stats) = stats {
            next.totals.add(stats);
        }
        next.refresh_derived();
        next
    }

    /// Recompute total_kills and kdr from the raw counters
    pub fn refresh_derived(&mut self) {
        self.total_kills = self.totals.total_kills();
        self.kdr = self.totals.kdr();
    }
}

/// Per-player totals across every guild the player has fought for,
/// versioned by war like the member aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerAggregate {
    pub id: Snowflake,
    pub user_profile_id: Snowflake,
    pub war_id: Snowflake,
    pub attendance: AttendanceCounts,
    pub totals: StatCounters,
    pub total_kills: i32,
    pub kdr: f64,
}

impl PlayerAggregate {
    pub fn new(id: Snowflake, user_profile_id: Snowflake) -> Self {
        Self {
            id,
            user_profile_id,
            war_id: Snowflake::new(0),
            attendance: AttendanceCounts::default(),
            totals: StatCounters::ZERO,
            total_kills: 0,
            kdr: 0.0,
        }
    }

    pub fn clone_and_increment(
        &self,
        new_id: Snowflake,
        war_id: Snowflake,
        classification: AttendanceClassification,
        stats: Option<&StatCounters>,
    ) -> Self {
        let mut next = self.clone();
        next.id = new_id;
        next.war_id = war_id;
        next.attendance.increment(classification);
        if let Some(stats) = stats {
            next.totals.add(stats);
        }
        next.refresh_derived();
        next
    }

    pub fn refresh_derived(&mut self) {
        self.total_kills = self.totals.total_kills();
        self.kdr = self.totals.kdr();
    }
}
