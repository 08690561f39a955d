//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Guild not found: {0}")]
    GuildNotFound(Snowflake),

    #[error("Profile not found: {0}")]
    ProfileNotFound(Snowflake),

    #[error("Character not found: {0}")]
    CharacterNotFound(Snowflake),

    #[error("Role not found: {0}")]
    RoleNotFound(Snowflake),

    #[error("Member not found in guild")]
    MemberNotFound,

    #[error("War not found: {0}")]
    WarNotFound(Snowflake),

    #[error("Attendance not found: {0}")]
    AttendanceNotFound(Snowflake),

    #[error("Team not found: {0}")]
    TeamNotFound(Snowflake),

    #[error("Call sign not found: {0}")]
    CallSignNotFound(Snowflake),

    #[error("War stat not found: {0}")]
    StatNotFound(Snowflake),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unknown region: {0}")]
    InvalidRegion(String),

    #[error("Invalid slot {slot}: team holds {max} slots")]
    InvalidSlot { slot: u16, max: u16 },

    #[error("Attendee is not a member of this guild: {0}")]
    InvalidAttendee(Snowflake),

    #[error("Attendance belongs to a different war")]
    AttendanceWrongWar,

    #[error("Character does not belong to the attendee")]
    CharacterNotOwned,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Missing permission: {0}")]
    MissingPermission(String),

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Already a member of this guild")]
    AlreadyMember,

    #[error("Attendance already recorded for this war")]
    AttendanceExists,

    #[error("Attendance already generated for this war")]
    AttendanceAlreadyGenerated,

    #[error("Guild name already taken in this region")]
    GuildNameExists,

    // =========================================================================
    // Business Rule Violations
    // =========================================================================
    #[error("War already finished")]
    WarAlreadyFinished,

    #[error("War is finished and can no longer be modified")]
    WarFinishedImmutable,

    #[error("Guild has no guild master")]
    GuildMasterMissing,

    #[error("Aggregate row missing for guild: {0}")]
    AggregateMissing(Snowflake),

    #[error("Aggregate history changed concurrently for profile: {0}")]
    AggregateConflict(Snowflake),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for logs and API responses
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::GuildNotFound(_) => "UNKNOWN_GUILD",
            Self::ProfileNotFound(_) => "UNKNOWN_PROFILE",
            Self::CharacterNotFound(_) => "UNKNOWN_CHARACTER",
            Self::RoleNotFound(_) => "UNKNOWN_ROLE",
            Self::MemberNotFound => "UNKNOWN_MEMBER",
            Self::WarNotFound(_) => "UNKNOWN_WAR",
            Self::AttendanceNotFound(_) => "UNKNOWN_ATTENDANCE",
            Self::TeamNotFound(_) => "UNKNOWN_TEAM",
            Self::CallSignNotFound(_) => "UNKNOWN_CALL_SIGN",
            Self::StatNotFound(_) => "UNKNOWN_STAT",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidRegion(_) => "INVALID_REGION",
            Self::InvalidSlot { .. } => "INVALID_SLOT",
            Self::InvalidAttendee(_) => "INVALID_ATTENDEE",
            Self::AttendanceWrongWar => "ATTENDANCE_WRONG_WAR",
            Self::CharacterNotOwned => "CHARACTER_NOT_OWNED",
            Self::MissingField(_) => "MISSING_FIELD",

            // Authorization
            Self::MissingPermission(_) => "MISSING_PERMISSIONS",

            // Conflict
            Self::AlreadyMember => "ALREADY_MEMBER",
            Self::AttendanceExists => "ATTENDANCE_EXISTS",
            Self::AttendanceAlreadyGenerated => "ATTENDANCE_ALREADY_GENERATED",
            Self::GuildNameExists => "GUILD_NAME_EXISTS",

            // Business Rules
            Self::WarAlreadyFinished => "WAR_ALREADY_FINISHED",
            Self::WarFinishedImmutable => "WAR_FINISHED_IMMUTABLE",
            Self::GuildMasterMissing => "GUILD_MASTER_MISSING",
            Self::AggregateMissing(_) => "AGGREGATE_MISSING",
            Self::AggregateConflict(_) => "AGGREGATE_CONFLICT",

            // Infrastructure
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::GuildNotFound(_)
                | Self::ProfileNotFound(_)
                | Self::CharacterNotFound(_)
                | Self::RoleNotFound(_)
                | Self::MemberNotFound
                | Self::WarNotFound(_)
                | Self::AttendanceNotFound(_)
                | Self::TeamNotFound(_)
                | Self::CallSignNotFound(_)
                | Self::StatNotFound(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidRegion(_)
                | Self::InvalidSlot { .. }
                | Self::InvalidAttendee(_)
                | Self::AttendanceWrongWar
                | Self::CharacterNotOwned
                | Self::MissingField(_)
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::MissingPermission(_))
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyMember
                | Self::AttendanceExists
                | Self::AttendanceAlreadyGenerated
                | Self::GuildNameExists
                | Self::WarAlreadyFinished
                | Self::WarFinishedImmutable
                | Self::AggregateConflict(_)
        )
    }
}
