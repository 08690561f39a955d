//! Guild role database model

use sqlx::FromRow;

/// Database model for guild_roles table (shared role hierarchy)
#[derive(Debug, Clone, FromRow)]
pub struct RoleModel {
    pub id: i64,
    pub name: String,
    pub priority: i32,
    pub permissions: i64,
}
