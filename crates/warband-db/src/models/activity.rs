//! Activity audit log database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for activities table
#[derive(Debug, Clone, FromRow)]
pub struct ActivityModel {
    pub id: i64,
    pub guild_id: i64,
    pub actor_profile_id: Option<i64>,
    pub kind: String,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}
