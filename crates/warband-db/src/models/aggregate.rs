//! Aggregate database models

use sqlx::FromRow;

/// Database model for guild_aggregates table (one row per guild)
#[derive(Debug, Clone, FromRow)]
pub struct GuildAggregateModel {
    pub id: i64,
    pub guild_id: i64,
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
    pub wars_won: i32,
    pub wars_lost: i32,
    pub wars_stalemated: i32,
}

/// Database model for guild_member_aggregates table (versioned by war)
#[derive(Debug, Clone, FromRow)]
pub struct MemberAggregateModel {
    pub id: i64,
    pub guild_id: i64,
    pub user_profile_id: i64,
    pub war_id: i64,
    pub wars_attended: i32,
    pub wars_unavailable: i32,
    pub wars_missed: i32,
    pub wars_reneged: i32,
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
    pub total_kills: i32,
    pub kdr: f64,
}

/// Database model for player_aggregates table (versioned by war)
#[derive(Debug, Clone, FromRow)]
pub struct PlayerAggregateModel {
    pub id: i64,
    pub user_profile_id: i64,
    pub war_id: i64,
    pub wars_attended: i32,
    pub wars_unavailable: i32,
    pub wars_missed: i32,
    pub wars_reneged: i32,
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
    pub total_kills: i32,
    pub kdr: f64,
}
