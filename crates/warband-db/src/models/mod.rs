//! Database models - SQLx-compatible structs for PostgreSQL tables

mod activity;
mod aggregate;
mod attendance;
mod call_sign;
mod character;
mod guild;
mod member;
mod profile;
mod role;
mod stat;
mod team;
mod war;

pub use activity::ActivityModel;
pub use aggregate::{GuildAggregateModel, MemberAggregateModel, PlayerAggregateModel};
pub use attendance::AttendanceModel;
pub use call_sign::CallSignModel;
pub use character::CharacterModel;
pub use guild::GuildModel;
pub use member::GuildMemberModel;
pub use profile::ProfileModel;
pub use role::RoleModel;
pub use stat::WarStatModel;
pub use team::{TeamModel, TeamSlotModel, WarRoleModel};
pub use war::WarModel;
