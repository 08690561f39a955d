//! War team, team slot, and battlefield role database models

use sqlx::FromRow;

/// Database model for war_teams table
#[derive(Debug, Clone, FromRow)]
pub struct TeamModel {
    pub id: i64,
    pub war_id: i64,
    pub name: String,
    pub kind: i16,
    /// Slot index -> battlefield role id overrides
    pub slot_setup: serde_json::Value,
    pub default_role_id: i64,
}

/// Database model for team_slots table
#[derive(Debug, Clone, FromRow)]
pub struct TeamSlotModel {
    pub team_id: i64,
    pub slot: i16,
    pub attendance_id: i64,
}

/// Database model for war_roles table
#[derive(Debug, Clone, FromRow)]
pub struct WarRoleModel {
    pub id: i64,
    pub name: String,
}
