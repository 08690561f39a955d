//! Ports - interfaces the domain needs the infrastructure to provide

mod notification;
mod plans;
mod repositories;

pub use notification::NotificationSink;
pub use plans::{
    AggregateBase, FinalizePlan, MemberRebuild, PlayerRebuild, RosterSyncPlan, StatRevisionPlan,
    StatusUpdate,
};
pub use repositories::{
    ActivityRepository, AggregateRepository, AttendanceRepository, CallSignRepository,
    CharacterRepository, GuildRepository, MemberRepository, ProfileRepository, RepoResult,
    RoleRepository, StatRepository, TeamRepository, TeamSlot, WarRepository,
};
