//! Value objects - immutable domain primitives

mod availability;
mod permissions;
mod snowflake;

pub use availability::{AvailabilityMap, AvailabilityStatus};
pub use permissions::GuildPermissions;
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
