//! Guild membership entity

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// A profile's membership in one guild
///
/// Unique per (guild, profile). The role determines the member's permission
/// set; exactly one member per guild holds the Guild Master role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildMember {
    pub guild_id: Snowflake,
    pub user_profile_id: Snowflake,
    pub role_id: Snowflake,
    pub joined_at: DateTime<Utc>,
}

impl GuildMember {
    pub fn new(guild_id: Snowflake, user_profile_id: Snowflake, role_id: Snowflake) -> Self {
        Self {
            guild_id,
            user_profile_id,
            role_id,
            joined_at: Utc::now(),
        }
    }
}
