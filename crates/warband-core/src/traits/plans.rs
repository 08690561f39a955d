//! Write plans - pre-computed multi-table writes applied in one transaction
//!
//! Services build these as plain data (ids pre-generated, deltas pre-summed)
//! and hand them to the repository layer, which applies each plan atomically.
//! This keeps the planning logic pure and unit-testable while the repository
//! owns transaction boundaries and row locking.

use std::collections::HashMap;

use crate::entities::{
    Activity, AttendanceStatus, GuildMember, GuildMemberAggregate, PlayerAggregate, StatCounters,
    WarAttendance, WarOutcome, WarStat,
};
use crate::value_objects::Snowflake;

/// One batched attendance status correction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: AttendanceStatus,
    pub attendance_ids: Vec<Snowflake>,
}

/// The versioned aggregate rows one attendee's new rows were computed from
///
/// The applying transaction re-checks these under a per-profile lock: if the
/// latest row id moved since the plan was built, the plan is stale and the
/// whole write is rejected rather than losing the concurrent increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateBase {
    pub user_profile_id: Snowflake,
    /// Latest member aggregate row the plan built on; `None` for a fresh member
    pub member_base: Option<Snowflake>,
    /// Latest player aggregate row the plan built on; `None` for a fresh player
    pub player_base: Option<Snowflake>,
}

/// Recomputed member aggregate history for one profile, replacing the stored
/// rows wholesale inside the revision transaction
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRebuild {
    pub guild_id: Snowflake,
    pub user_profile_id: Snowflake,
    /// Latest stored row id when the rebuild was computed, checked under lock
    pub expected_latest: Option<Snowflake>,
    pub rows: Vec<GuildMemberAggregate>,
}

/// Recomputed cross-guild player aggregate history for one profile
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRebuild {
    pub user_profile_id: Snowflake,
    pub expected_latest: Option<Snowflake>,
    pub rows: Vec<PlayerAggregate>,
}

/// Everything written when a war is finalized
///
/// Applied in one transaction. The outcome write is conditional on the war
/// still being pending, and the guild aggregate row is locked before the
/// deltas are added, so concurrent finalizations cannot double-count.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizePlan {
    pub war_id: Snowflake,
    pub guild_id: Snowflake,
    pub outcome: WarOutcome,
    pub note: Option<String>,
    /// Rows created for walk-ins named by family name with no sign-up row
    pub attendance_inserts: Vec<WarAttendance>,
    /// Fresh per-war stat rows for attendees who fought
    pub stats: Vec<WarStat>,
    /// Batched status corrections (reneged, late, no-show)
    pub status_updates: Vec<StatusUpdate>,
    /// Sum of all stat rows, folded into the guild aggregate under lock
    pub guild_delta: StatCounters,
    /// New versioned per-member aggregate rows
    pub member_rows: Vec<GuildMemberAggregate>,
    /// New versioned per-player aggregate rows
    pub player_rows: Vec<PlayerAggregate>,
    /// Base rows the member/player rows increment, re-checked under lock
    pub bases: Vec<AggregateBase>,
    pub activity: Activity,
}

/// Everything written when a finished war's stats are revised
///
/// Carries the recomputed aggregate histories for every affected profile,
/// so the stat diff and the aggregate fallout land in one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct StatRevisionPlan {
    pub war_id: Snowflake,
    pub guild_id: Snowflake,
    /// `(from, to)` when the recorded outcome itself changed
    pub outcome_change: Option<(WarOutcome, WarOutcome)>,
    pub note: Option<String>,
    /// Rows created for walk-ins named by family name with no sign-up row
    pub attendance_inserts: Vec<WarAttendance>,
    pub stat_updates: Vec<WarStat>,
    pub stat_inserts: Vec<WarStat>,
    pub stat_deletes: Vec<Snowflake>,
    /// Status corrections for attendees whose participation was revised
    pub status_updates: Vec<StatusUpdate>,
    /// Signed counter delta applied to the guild aggregate under lock
    pub guild_delta: StatCounters,
    /// Replacement aggregate histories for the affected profiles
    pub member_rebuilds: Vec<MemberRebuild>,
    pub player_rebuilds: Vec<PlayerRebuild>,
    pub activity: Activity,
}

/// Roster changes computed by diffing the external member list against the
/// local one, applied in one transaction together with the refreshed cache.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterSyncPlan {
    pub guild_id: Snowflake,
    pub add: Vec<GuildMember>,
    /// Existing members whose role changed: (profile, new role)
    pub update_roles: Vec<(Snowflake, Snowflake)>,
    /// Members no longer present in the external roster
    pub remove: Vec<Snowflake>,
    /// New external member id -> local role id snapshot
    pub member_cache: HashMap<String, Snowflake>,
}

impl RosterSyncPlan {
    /// Whether applying this plan would change anything beyond the cache
    pub fn is_noop(&self) -> bool {
        self.add.is_empty() && self.update_roles.is_empty() && self.remove.is_empty()
    }
}
