//! # warband-core
//!
//! Domain layer for the guild war tracker: entities, value objects, repository
//! traits, and domain events. This crate has zero dependencies on
//! infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Activity, ActivityKind, AttendanceClassification, AttendanceCounts, AttendanceStatus,
    Character, Guild, GuildAggregate, GuildIntegration, GuildMember, GuildMemberAggregate,
    GuildRole, NotificationToggles, PlayerAggregate, Profile, StatCounters, War, WarAttendance,
    WarCallSign, WarNode, WarOutcome, WarRole, WarStat, WarTeam, TeamKind, GUILD_MASTER_ROLE,
};
pub use error::DomainError;
pub use events::WarEvent;
pub use traits::{
    ActivityRepository, AggregateRepository, AttendanceRepository, CallSignRepository,
    CharacterRepository, FinalizePlan, GuildRepository, MemberRepository, NotificationSink,
    ProfileRepository, RepoResult, RoleRepository, RosterSyncPlan, StatRepository,
    StatRevisionPlan, StatusUpdate, TeamRepository, TeamSlot, WarRepository,
};
pub use value_objects::{
    AvailabilityMap, AvailabilityStatus, GuildPermissions, Snowflake, SnowflakeGenerator,
    SnowflakeParseError,
};
