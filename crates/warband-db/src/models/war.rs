//! War database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for wars table
#[derive(Debug, Clone, FromRow)]
pub struct WarModel {
    pub id: i64,
    pub guild_id: i64,
    pub date: DateTime<Utc>,
    pub node_name: Option<String>,
    pub node_tier: Option<i16>,
    pub outcome: Option<i16>,
    pub note: Option<String>,
    pub reminder_sent: bool,
}

impl WarModel {
    /// Pending wars carry no outcome yet
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.outcome.is_none()
    }
}
