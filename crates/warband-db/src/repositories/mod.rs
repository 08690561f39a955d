//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in
//! warband-core. Each repository handles database operations for a specific
//! domain entity; the war, stat, and member repositories additionally apply
//! the multi-table write plans inside one transaction.

mod activity;
mod aggregate;
mod attendance;
mod call_sign;
mod character;
mod error;
mod guild;
mod member;
mod profile;
mod role;
mod stat;
mod team;
mod war;

pub use activity::PgActivityRepository;
pub use aggregate::PgAggregateRepository;
pub use attendance::PgAttendanceRepository;
pub use call_sign::PgCallSignRepository;
pub use character::PgCharacterRepository;
pub use guild::PgGuildRepository;
pub use member::PgMemberRepository;
pub use profile::PgProfileRepository;
pub use role::PgRoleRepository;
pub use stat::PgStatRepository;
pub use team::PgTeamRepository;
pub use war::PgWarRepository;
