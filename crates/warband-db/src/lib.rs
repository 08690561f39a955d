//! # warband-db
//!
//! Database layer implementing repository traits with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! This crate provides PostgreSQL implementations for all repository traits
//! defined in `warband-core`. It handles:
//!
//! - Connection pool management
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - Repository implementations, including the transactional write plans
//!   (war finalization, stat revision, roster sync)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warband_db::pool::create_pool_from_env;
//! use warband_db::repositories::PgWarRepository;
//! use warband_core::traits::WarRepository;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool_from_env().await?;
//!     let war_repo = PgWarRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, create_pool_from_env, DatabaseConfig, PgPool};
pub use repositories::{
    PgActivityRepository, PgAggregateRepository, PgAttendanceRepository, PgCallSignRepository,
    PgCharacterRepository, PgGuildRepository, PgMemberRepository, PgProfileRepository,
    PgRoleRepository, PgStatRepository, PgTeamRepository, PgWarRepository,
};
