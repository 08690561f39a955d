//! Per-war stat database model

use sqlx::FromRow;

/// Database model for war_stats table
#[derive(Debug, Clone, FromRow)]
pub struct WarStatModel {
    pub id: i64,
    pub attendance_id: i64,
    pub command_post: i32,
    pub fort: i32,
    pub gate: i32,
    pub help: i32,
    pub mount: i32,
    pub placed_objects: i32,
    pub guild_master: i32,
    pub officer: i32,
    pub member: i32,
    pub death: i32,
    pub siege_weapons: i32,
}
