//! Guild database model

use chrono::NaiveTime;
use sqlx::FromRow;

/// Database model for guilds table
///
/// Integration settings are flattened into the row; the two JSONB columns
/// hold the role name mapping and the cached external member snapshot.
#[derive(Debug, Clone, FromRow)]
pub struct GuildModel {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub logo_url: Option<String>,
    pub region: String,
    pub war_start_time: NaiveTime,
    pub external_id: Option<String>,
    pub webhook_url: Option<String>,
    pub notify_war_create: bool,
    pub notify_war_cancel: bool,
    pub notify_war_end: bool,
    pub reminder_minutes: i32,
    pub role_map: serde_json::Value,
    pub member_cache: serde_json::Value,
}
