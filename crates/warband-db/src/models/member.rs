//! Guild membership database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for guild_members table
#[derive(Debug, Clone, FromRow)]
pub struct GuildMemberModel {
    pub guild_id: i64,
    pub user_profile_id: i64,
    pub role_id: i64,
    pub joined_at: DateTime<Utc>,
}
