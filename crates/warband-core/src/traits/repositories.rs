//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    Activity, Character, Guild, GuildAggregate, GuildIntegration, GuildMember,
    GuildMemberAggregate, GuildRole, PlayerAggregate, Profile, War, WarAttendance, WarCallSign,
    WarRole, WarStat, WarTeam,
};
use crate::error::DomainError;
use crate::traits::plans::{FinalizePlan, RosterSyncPlan, StatRevisionPlan};
use crate::value_objects::Snowflake;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Guild Repository
// ============================================================================

#[async_trait]
pub trait GuildRepository: Send + Sync {
    /// Find guild by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Guild>>;

    /// List all guilds a profile is a member of
    async fn find_by_profile(&self, profile_id: Snowflake) -> RepoResult<Vec<Guild>>;

    /// List every guild with an external integration configured
    async fn find_integrated(&self) -> RepoResult<Vec<Guild>>;

    /// Check if a guild name is already taken in a region
    async fn name_exists(&self, name: &str, region: &str) -> RepoResult<bool>;

    /// Create a new guild
    async fn create(&self, guild: &Guild) -> RepoResult<()>;

    /// Update an existing guild
    async fn update(&self, guild: &Guild) -> RepoResult<()>;

    /// Update only the integration settings
    async fn update_integration(
        &self,
        guild_id: Snowflake,
        integration: &GuildIntegration,
    ) -> RepoResult<()>;

    /// Delete a guild and everything scoped to it
    async fn delete(&self, id: Snowflake) -> RepoResult<()>;
}

// ============================================================================
// Role Repository
// ============================================================================

#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Find role by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<GuildRole>>;

    /// Find role by name
    async fn find_by_name(&self, name: &str) -> RepoResult<Option<GuildRole>>;

    /// List all roles, highest authority (lowest priority value) first
    async fn find_all(&self) -> RepoResult<Vec<GuildRole>>;

    /// Create a new role
    async fn create(&self, role: &GuildRole) -> RepoResult<()>;

    /// Update an existing role
    async fn update(&self, role: &GuildRole) -> RepoResult<()>;

    /// Delete a role
    async fn delete(&self, id: Snowflake) -> RepoResult<()>;
}

// ============================================================================
// Profile Repository
// ============================================================================

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Find profile by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Profile>>;

    /// Find profile by its external account id
    async fn find_by_external_id(&self, external_id: &str) -> RepoResult<Option<Profile>>;

    /// Find profile by family name (case-insensitive)
    async fn find_by_family_name(&self, family_name: &str) -> RepoResult<Option<Profile>>;

    /// Create a new profile
    async fn create(&self, profile: &Profile) -> RepoResult<()>;

    /// Update an existing profile
    async fn update(&self, profile: &Profile) -> RepoResult<()>;
}

// ============================================================================
// Character Repository
// ============================================================================

#[async_trait]
pub trait CharacterRepository: Send + Sync {
    /// Find character by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Character>>;

    /// List a profile's characters
    async fn find_by_profile(&self, profile_id: Snowflake) -> RepoResult<Vec<Character>>;

    /// Find a profile's main character
    async fn find_main(&self, profile_id: Snowflake) -> RepoResult<Option<Character>>;

    /// Create a new character
    async fn create(&self, character: &Character) -> RepoResult<()>;

    /// Update an existing character; setting `is_main` clears the previous main
    async fn update(&self, character: &Character) -> RepoResult<()>;

    /// Delete a character
    async fn delete(&self, id: Snowflake) -> RepoResult<()>;
}

// ============================================================================
// Member Repository
// ============================================================================

#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Find a membership row
    async fn find(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
    ) -> RepoResult<Option<GuildMember>>;

    /// List members of a guild
    async fn find_by_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<GuildMember>>;

    /// List all memberships of a profile
    async fn find_by_profile(&self, profile_id: Snowflake) -> RepoResult<Vec<GuildMember>>;

    /// Add a member to a guild
    async fn create(&self, member: &GuildMember) -> RepoResult<()>;

    /// Change a member's role
    async fn update_role(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
        role_id: Snowflake,
    ) -> RepoResult<()>;

    /// Remove a member from a guild
    async fn delete(&self, guild_id: Snowflake, profile_id: Snowflake) -> RepoResult<()>;

    /// Apply a computed roster diff plus cache refresh in one transaction
    async fn apply_sync(&self, plan: &RosterSyncPlan) -> RepoResult<()>;
}

// ============================================================================
// War Repository
// ============================================================================

#[async_trait]
pub trait WarRepository: Send + Sync {
    /// Find war by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<War>>;

    /// List wars of a guild, newest first
    async fn find_by_guild(&self, guild_id: Snowflake, limit: i64) -> RepoResult<Vec<War>>;

    /// Find the guild's pending war, if any
    async fn find_pending(&self, guild_id: Snowflake) -> RepoResult<Option<War>>;

    /// Most recently finished war of a guild
    async fn find_latest_finished(&self, guild_id: Snowflake) -> RepoResult<Option<War>>;

    /// Pending wars starting within the window whose reminder has not gone out
    async fn find_due_reminders(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> RepoResult<Vec<War>>;

    /// Create a new war
    async fn create(&self, war: &War) -> RepoResult<()>;

    /// Update a pending war's date, node, and note
    async fn update(&self, war: &War) -> RepoResult<()>;

    /// Mark the pre-war reminder as sent
    async fn mark_reminder_sent(&self, id: Snowflake) -> RepoResult<()>;

    /// Delete a war and everything scoped to it
    async fn delete(&self, id: Snowflake) -> RepoResult<()>;

    /// Apply a finalization plan in one transaction
    ///
    /// Fails with [`DomainError::WarAlreadyFinished`] when the war gained an
    /// outcome since the plan was built.
    async fn apply_finalize(&self, plan: &FinalizePlan) -> RepoResult<()>;
}

// ============================================================================
// Attendance Repository
// ============================================================================

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Find attendance by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<WarAttendance>>;

    /// List attendance rows for a war
    async fn find_by_war(&self, war_id: Snowflake) -> RepoResult<Vec<WarAttendance>>;

    /// Find one profile's attendance for a war
    async fn find_by_war_and_profile(
        &self,
        war_id: Snowflake,
        profile_id: Snowflake,
    ) -> RepoResult<Option<WarAttendance>>;

    /// Whether any attendance rows exist for a war
    async fn exists_for_war(&self, war_id: Snowflake) -> RepoResult<bool>;

    /// Create one attendance row
    async fn create(&self, attendance: &WarAttendance) -> RepoResult<()>;

    /// Bulk insert attendance rows (war roster generation)
    async fn create_many(&self, rows: &[WarAttendance]) -> RepoResult<()>;

    /// Update status, character, and note
    async fn update(&self, attendance: &WarAttendance) -> RepoResult<()>;

    /// One profile's attendance rows across a guild's finished wars
    async fn find_finalized_by_guild_profile(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
    ) -> RepoResult<Vec<WarAttendance>>;

    /// One profile's attendance rows across every finished war
    async fn find_finalized_by_profile(
        &self,
        profile_id: Snowflake,
    ) -> RepoResult<Vec<WarAttendance>>;
}

// ============================================================================
// Team Repository
// ============================================================================

/// One slot assignment: unique per (team, slot) and per attendee within a war
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamSlot {
    pub team_id: Snowflake,
    pub slot: u16,
    pub attendance_id: Snowflake,
}

#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Find team by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<WarTeam>>;

    /// List teams of a war
    async fn find_by_war(&self, war_id: Snowflake) -> RepoResult<Vec<WarTeam>>;

    /// Create a new team
    async fn create(&self, team: &WarTeam) -> RepoResult<()>;

    /// Update an existing team
    async fn update(&self, team: &WarTeam) -> RepoResult<()>;

    /// Delete a team and its slot assignments
    async fn delete(&self, id: Snowflake) -> RepoResult<()>;

    /// Slot assignments for one team
    async fn find_slots(&self, team_id: Snowflake) -> RepoResult<Vec<TeamSlot>>;

    /// Slot assignments across all teams of a war
    async fn find_slots_by_war(&self, war_id: Snowflake) -> RepoResult<Vec<TeamSlot>>;

    /// Assign an attendee to a slot in one transaction: moves the attendee
    /// out of any slot they hold in the war and evicts the target slot's
    /// current occupant
    async fn set_slot(&self, war_id: Snowflake, slot: TeamSlot) -> RepoResult<()>;

    /// Clear one slot
    async fn clear_slot(&self, team_id: Snowflake, slot: u16) -> RepoResult<()>;

    /// Find a battlefield role by ID
    async fn find_role(&self, id: Snowflake) -> RepoResult<Option<WarRole>>;

    /// List all battlefield roles
    async fn find_roles(&self) -> RepoResult<Vec<WarRole>>;

    /// Create a battlefield role
    async fn create_role(&self, role: &WarRole) -> RepoResult<()>;
}

// ============================================================================
// Call Sign Repository
// ============================================================================

#[async_trait]
pub trait CallSignRepository: Send + Sync {
    /// Find call sign by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<WarCallSign>>;

    /// List call signs of a war
    async fn find_by_war(&self, war_id: Snowflake) -> RepoResult<Vec<WarCallSign>>;

    /// Create a new call sign
    async fn create(&self, call_sign: &WarCallSign) -> RepoResult<()>;

    /// Update an existing call sign
    async fn update(&self, call_sign: &WarCallSign) -> RepoResult<()>;

    /// Delete a call sign and its memberships
    async fn delete(&self, id: Snowflake) -> RepoResult<()>;

    /// Attendance ids grouped under a call sign
    async fn find_members(&self, call_sign_id: Snowflake) -> RepoResult<Vec<Snowflake>>;

    /// Add an attendee to a call sign
    async fn add_member(&self, call_sign_id: Snowflake, attendance_id: Snowflake) -> RepoResult<()>;

    /// Remove an attendee from a call sign
    async fn remove_member(
        &self,
        call_sign_id: Snowflake,
        attendance_id: Snowflake,
    ) -> RepoResult<()>;
}

// ============================================================================
// Stat Repository
// ============================================================================

#[async_trait]
pub trait StatRepository: Send + Sync {
    /// Find stat row by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<WarStat>>;

    /// Find the stat row attached to an attendance
    async fn find_by_attendance(&self, attendance_id: Snowflake) -> RepoResult<Option<WarStat>>;

    /// All stat rows of one war
    async fn find_by_war(&self, war_id: Snowflake) -> RepoResult<Vec<WarStat>>;

    /// All stat rows across a profile's attendance within one guild
    async fn find_by_guild_profile(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
    ) -> RepoResult<Vec<WarStat>>;

    /// All stat rows across a profile's attendance in every guild
    async fn find_by_profile(&self, profile_id: Snowflake) -> RepoResult<Vec<WarStat>>;

    /// Apply a stat revision plan in one transaction
    async fn apply_revision(&self, plan: &StatRevisionPlan) -> RepoResult<()>;
}

// ============================================================================
// Aggregate Repository
// ============================================================================

#[async_trait]
pub trait AggregateRepository: Send + Sync {
    /// Guild-wide aggregate row
    async fn find_guild(&self, guild_id: Snowflake) -> RepoResult<Option<GuildAggregate>>;

    /// Create the guild aggregate row (at guild creation)
    async fn create_guild(&self, aggregate: &GuildAggregate) -> RepoResult<()>;

    /// Latest versioned aggregate row for a member within a guild
    async fn find_member_latest(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
    ) -> RepoResult<Option<GuildMemberAggregate>>;

    /// Latest member aggregate rows for every member of a guild
    async fn find_members_latest(
        &self,
        guild_id: Snowflake,
    ) -> RepoResult<Vec<GuildMemberAggregate>>;

    /// Latest versioned aggregate row for a player across all guilds
    async fn find_player_latest(
        &self,
        profile_id: Snowflake,
    ) -> RepoResult<Option<PlayerAggregate>>;

    /// Replace a member's aggregate history with recomputed rows
    async fn replace_member_rows(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
        rows: &[GuildMemberAggregate],
    ) -> RepoResult<()>;

    /// Replace a player's aggregate history with recomputed rows
    async fn replace_player_rows(
        &self,
        profile_id: Snowflake,
        rows: &[PlayerAggregate],
    ) -> RepoResult<()>;

    /// Overwrite the guild aggregate row with recomputed totals
    async fn replace_guild(&self, aggregate: &GuildAggregate) -> RepoResult<()>;
}

// ============================================================================
// Activity Repository
// ============================================================================

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Record one audit entry
    async fn create(&self, activity: &Activity) -> RepoResult<()>;

    /// Recent audit entries for a guild, newest first
    async fn find_by_guild(&self, guild_id: Snowflake, limit: i64) -> RepoResult<Vec<Activity>>;
}
