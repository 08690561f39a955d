//! Domain entities

mod activity;
mod aggregate;
mod attendance;
mod character;
mod guild;
mod member;
mod profile;
mod role;
mod stat;
mod team;
mod war;

pub use activity::{Activity, ActivityKind};
pub use aggregate::{
    AttendanceClassification, AttendanceCounts, GuildAggregate, GuildMemberAggregate,
    PlayerAggregate,
};
pub use attendance::{reconcile_attendance, AttendanceStatus, WarAttendance};
pub use character::Character;
pub use guild::{Guild, GuildIntegration, NotificationToggles};
pub use member::GuildMember;
pub use profile::Profile;
pub use role::{GuildRole, GUILD_MASTER_ROLE};
pub use stat::{StatCounters, WarStat};
pub use team::{TeamKind, WarCallSign, WarRole, WarTeam};
pub use war::{War, WarNode, WarOutcome};
