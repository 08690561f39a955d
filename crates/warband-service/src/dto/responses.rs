//! Response DTOs
//!
//! Snowflake ids are serialized as strings for JavaScript compatibility.

use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;

use warband_core::entities::StatCounters;
use warband_core::value_objects::Snowflake;

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Guild Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct GuildResponse {
    pub id: Snowflake,
    pub name: String,
    pub description: String,
    pub logo_url: Option<String>,
    pub region: String,
    pub war_start_time: NaiveTime,
    pub integration: IntegrationResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrationResponse {
    pub external_id: Option<String>,
    /// Webhook configured, URL itself never leaves the service layer
    pub webhook_configured: bool,
    pub notify_war_create: bool,
    pub notify_war_cancel: bool,
    pub notify_war_end: bool,
    pub reminder_minutes: i32,
    pub role_map: HashMap<Snowflake, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleResponse {
    pub id: Snowflake,
    pub name: String,
    pub priority: i32,
    pub permissions: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberResponse {
    pub guild_id: Snowflake,
    pub user_profile_id: Snowflake,
    pub role_id: Snowflake,
    pub joined_at: DateTime<Utc>,
}

// ============================================================================
// Profile Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub id: Snowflake,
    pub family_name: String,
    pub external_id: Option<String>,
    pub availability: HashMap<String, i16>,
    pub auto_sign_up: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CharacterResponse {
    pub id: Snowflake,
    pub profile_id: Snowflake,
    pub name: String,
    pub class_name: String,
    pub level: i32,
    pub is_main: bool,
}

// ============================================================================
// War Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct WarResponse {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub date: DateTime<Utc>,
    pub node_name: Option<String>,
    pub node_tier: Option<i16>,
    pub outcome: Option<&'static str>,
    pub note: Option<String>,
    pub pending: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceResponse {
    pub id: Snowflake,
    pub war_id: Snowflake,
    pub user_profile_id: Snowflake,
    pub character_id: Option<Snowflake>,
    pub status: i16,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamResponse {
    pub id: Snowflake,
    pub war_id: Snowflake,
    pub name: String,
    pub kind: &'static str,
    pub max_slots: u16,
    pub default_role_id: Snowflake,
    pub slot_setup: HashMap<u16, Snowflake>,
    /// Slot index -> attendance id
    pub slots: HashMap<u16, Snowflake>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallSignResponse {
    pub id: Snowflake,
    pub war_id: Snowflake,
    pub name: String,
    pub members: Vec<Snowflake>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WarRoleResponse {
    pub id: Snowflake,
    pub name: String,
}

// ============================================================================
// Stat and Aggregate Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct WarStatResponse {
    pub id: Snowflake,
    pub attendance_id: Snowflake,
    #[serde(flatten)]
    pub counters: StatCounters,
    pub total_kills: i32,
    /// Per-war KDR; `null` when the player never died
    pub kdr: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuildAggregateResponse {
    pub guild_id: Snowflake,
    #[serde(flatten)]
    pub totals: StatCounters,
    pub total_kills: i32,
    pub kdr: f64,
    pub wars_won: i32,
    pub wars_lost: i32,
    pub wars_stalemated: i32,
    pub wars_finished: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberAggregateResponse {
    pub guild_id: Snowflake,
    pub user_profile_id: Snowflake,
    pub wars_attended: i32,
    pub wars_unavailable: i32,
    pub wars_missed: i32,
    pub wars_reneged: i32,
    #[serde(flatten)]
    pub totals: StatCounters,
    pub total_kills: i32,
    pub kdr: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerAggregateResponse {
    pub user_profile_id: Snowflake,
    pub wars_attended: i32,
    pub wars_unavailable: i32,
    pub wars_missed: i32,
    pub wars_reneged: i32,
    #[serde(flatten)]
    pub totals: StatCounters,
    pub total_kills: i32,
    pub kdr: f64,
}

// ============================================================================
// Activity Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ActivityResponse {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub actor_profile_id: Option<Snowflake>,
    pub kind: &'static str,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}
