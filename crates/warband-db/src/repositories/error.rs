//! Error handling utilities for repositories

use sqlx::Error as SqlxError;
use warband_core::error::DomainError;
use warband_core::value_objects::Snowflake;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Check for unique violation and return appropriate error or fallback
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    DomainError::DatabaseError(e.to_string())
}

/// Create a "guild not found" error
pub fn guild_not_found(id: Snowflake) -> DomainError {
    DomainError::GuildNotFound(id)
}

/// Create a "profile not found" error
pub fn profile_not_found(id: Snowflake) -> DomainError {
    DomainError::ProfileNotFound(id)
}

/// Create a "character not found" error
pub fn character_not_found(id: Snowflake) -> DomainError {
    DomainError::CharacterNotFound(id)
}

/// Create a "role not found" error
pub fn role_not_found(id: Snowflake) -> DomainError {
    DomainError::RoleNotFound(id)
}

/// Create a "member not found" error
pub fn member_not_found() -> DomainError {
    DomainError::MemberNotFound
}

/// Create a "war not found" error
pub fn war_not_found(id: Snowflake) -> DomainError {
    DomainError::WarNotFound(id)
}

/// Create an "attendance not found" error
pub fn attendance_not_found(id: Snowflake) -> DomainError {
    DomainError::AttendanceNotFound(id)
}

/// Create a "team not found" error
pub fn team_not_found(id: Snowflake) -> DomainError {
    DomainError::TeamNotFound(id)
}

/// Create a "call sign not found" error
pub fn call_sign_not_found(id: Snowflake) -> DomainError {
    DomainError::CallSignNotFound(id)
}
