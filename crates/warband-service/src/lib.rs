//! # warband-service
//!
//! Application layer for the guild war tracker: services orchestrating the
//! war lifecycle, attendance rosters, team assignment, finalization, stat
//! aggregates, and external roster sync. Transport adapters (HTTP, bots,
//! exporters) sit on top of this crate and never reach into the repositories
//! directly.

pub mod dto;
pub mod notify;
pub mod services;

pub use notify::LogNotificationSink;
pub use services::{
    AggregateService, AttendanceService, FinalizeService, GuildService, PermissionService,
    ProfileService, ReminderService, RosterSyncService, ServiceContext, ServiceContextBuilder,
    ServiceError, ServiceResult, TeamService, WarService,
};
