//! Business logic services
//!
//! This module contains all service layer implementations that handle
//! business logic, validation, and orchestration of domain operations.

pub mod aggregate;
pub mod attendance;
pub mod context;
pub mod error;
pub mod finalize;
pub mod guild;
pub mod permission;
pub mod profile;
pub mod reminder;
pub mod roster_sync;
pub mod team;
pub mod war;

#[cfg(test)]
pub(crate) mod support;

// Re-export all services for convenience
pub use aggregate::AggregateService;
pub use attendance::AttendanceService;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use finalize::FinalizeService;
pub use guild::GuildService;
pub use permission::PermissionService;
pub use profile::ProfileService;
pub use reminder::ReminderService;
pub use roster_sync::RosterSyncService;
pub use team::TeamService;
pub use war::WarService;
