//! Guild role entity <-> model mapper

use warband_core::entities::GuildRole;
use warband_core::value_objects::{GuildPermissions, Snowflake};

use crate::models::RoleModel;

impl From<RoleModel> for GuildRole {
    fn from(model: RoleModel) -> Self {
        GuildRole {
            id: Snowflake::new(model.id),
            name: model.name,
            priority: model.priority,
            // Unknown bits from newer schema versions are dropped
            permissions: GuildPermissions::from_i64(model.permissions),
        }
    }
}
