//! Guild role entity

use crate::value_objects::{GuildPermissions, Snowflake};

/// Name of the protected top role. Every guild has exactly one member
/// holding it; roster sync must never demote or remove that membership.
pub const GUILD_MASTER_ROLE: &str = "Guild Master";

/// A guild rank carrying a permission set
///
/// Roles are shared across guilds (a fixed hierarchy: Guild Master, Officer,
/// Quartermaster, Member, Mercenary). `priority` orders them by authority,
/// lower value = higher authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildRole {
    pub id: Snowflake,
    pub name: String,
    pub priority: i32,
    pub permissions: GuildPermissions,
}

impl GuildRole {
    pub fn is_guild_master(&self) -> bool {
        self.name == GUILD_MASTER_ROLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guild_master_detection() {
        let gm = GuildRole {
            id: Snowflake::new(1),
            name: GUILD_MASTER_ROLE.to_string(),
            priority: 0,
            permissions: GuildPermissions::ALL,
        };
        let member = GuildRole {
            id: Snowflake::new(4),
            name: "Member".to_string(),
            priority: 3,
            permissions: GuildPermissions::MEMBER,
        };
        assert!(gm.is_guild_master());
        assert!(!member.is_guild_master());
    }
}
