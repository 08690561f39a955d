//! Guild activity audit log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// What happened, recorded per guild with the acting profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    GuildCreate,
    GuildUpdate,
    GuildDelete,
    GuildUpdateIntegration,
    WarCreate,
    WarUpdate,
    WarDelete,
    WarEnd,
    AttendanceUpdate,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GuildCreate => "guild_create",
            Self::GuildUpdate => "guild_update",
            Self::GuildDelete => "guild_delete",
            Self::GuildUpdateIntegration => "guild_update_integration",
            Self::WarCreate => "war_create",
            Self::WarUpdate => "war_update",
            Self::WarDelete => "war_delete",
            Self::WarEnd => "war_end",
            Self::AttendanceUpdate => "attendance_update",
        }
    }

    pub fn from_str_value(value: &str) -> Option<Self> {
        match value {
            "guild_create" => Some(Self::GuildCreate),
            "guild_update" => Some(Self::GuildUpdate),
            "guild_delete" => Some(Self::GuildDelete),
            "guild_update_integration" => Some(Self::GuildUpdateIntegration),
            "war_create" => Some(Self::WarCreate),
            "war_update" => Some(Self::WarUpdate),
            "war_delete" => Some(Self::WarDelete),
            "war_end" => Some(Self::WarEnd),
            "attendance_update" => Some(Self::AttendanceUpdate),
            _ => None,
        }
    }
}

/// One audit log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    /// Acting profile; `None` for system-initiated actions (e.g. reminders)
    pub actor_profile_id: Option<Snowflake>,
    pub kind: ActivityKind,
    /// Human-readable detail, e.g. the war date or changed field names
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    pub fn new(
        id: Snowflake,
        guild_id: Snowflake,
        actor_profile_id: Option<Snowflake>,
        kind: ActivityKind,
        detail: Option<String>,
    ) -> Self {
        Self {
            id,
            guild_id,
            actor_profile_id,
            kind,
            detail,
            created_at: Utc::now(),
        }
    }
}
