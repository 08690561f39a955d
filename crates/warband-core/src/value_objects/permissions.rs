//! Guild permission bitflags
//!
//! Each guild role carries a permission bitset stored as a BIGINT in the
//! database. The string codenames match what collaborator layers (HTTP
//! adapters, admin tooling) use to gate operations.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Permission flags attached to a guild role
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GuildPermissions: u64 {
        /// See the guild overview page
        const VIEW_OVERVIEW            = 1 << 0;
        /// See the member list
        const VIEW_MEMBERS             = 1 << 1;
        /// See past war history
        const VIEW_HISTORY             = 1 << 2;
        /// See the war page for a pending war
        const VIEW_WAR                 = 1 << 3;
        /// See the guild activity log
        const VIEW_ACTIVITY_LOG        = 1 << 4;
        /// Edit basic guild information
        const CHANGE_GUILD_INFO        = 1 << 5;
        /// Edit the guild's external integration settings
        const CHANGE_GUILD_INTEGRATION = 1 << 6;
        /// Edit another member's attendance
        const CHANGE_MEMBER_ATTENDANCE = 1 << 7;
        /// Edit own attendance
        const CHANGE_MY_ATTENDANCE     = 1 << 8;
        /// Modify war setup (date, node, note)
        const CHANGE_WAR               = 1 << 9;
        /// Start a pending war
        const ADD_WAR                  = 1 << 10;
        /// Delete a pending war
        const DELETE_WAR               = 1 << 11;
        /// Create, edit or delete teams
        const MANAGE_TEAM              = 1 << 12;
        /// Create, edit or delete call signs
        const MANAGE_CALL_SIGN         = 1 << 13;

        /// Default permissions for a rank-and-file member
        const MEMBER = Self::VIEW_OVERVIEW.bits()
            | Self::VIEW_MEMBERS.bits()
            | Self::VIEW_HISTORY.bits()
            | Self::VIEW_WAR.bits()
            | Self::CHANGE_MY_ATTENDANCE.bits();

        /// Officer permissions: everything a member has plus war management
        const OFFICER = Self::MEMBER.bits()
            | Self::VIEW_ACTIVITY_LOG.bits()
            | Self::CHANGE_MEMBER_ATTENDANCE.bits()
            | Self::CHANGE_WAR.bits()
            | Self::ADD_WAR.bits()
            | Self::DELETE_WAR.bits()
            | Self::MANAGE_TEAM.bits()
            | Self::MANAGE_CALL_SIGN.bits();

        /// All permissions (Guild Master)
        const ALL = u64::MAX;
    }
}

impl GuildPermissions {
    /// Check if the permission set contains a required permission
    #[inline]
    pub fn has(&self, permission: GuildPermissions) -> bool {
        self.contains(permission)
    }

    /// Combine permissions from multiple roles
    pub fn combine<I>(roles: I) -> Self
    where
        I: IntoIterator<Item = GuildPermissions>,
    {
        roles
            .into_iter()
            .fold(GuildPermissions::empty(), |acc, p| acc | p)
    }

    /// Get the raw bits as i64 (for database storage)
    #[inline]
    pub fn to_i64(self) -> i64 {
        self.bits() as i64
    }

    /// Create from raw i64 bits (from database)
    #[inline]
    pub fn from_i64(bits: i64) -> Self {
        GuildPermissions::from_bits_truncate(bits as u64)
    }

    /// Resolve a single permission from its string codename
    pub fn from_codename(codename: &str) -> Option<Self> {
        let permission = match codename {
            "view_overview" => Self::VIEW_OVERVIEW,
            "view_members" => Self::VIEW_MEMBERS,
            "view_history" => Self::VIEW_HISTORY,
            "view_war" => Self::VIEW_WAR,
            "view_activity_log" => Self::VIEW_ACTIVITY_LOG,
            "change_guild_info" => Self::CHANGE_GUILD_INFO,
            "change_guild_integration" => Self::CHANGE_GUILD_INTEGRATION,
            "change_member_attendance" => Self::CHANGE_MEMBER_ATTENDANCE,
            "change_my_attendance" => Self::CHANGE_MY_ATTENDANCE,
            "change_war" => Self::CHANGE_WAR,
            "add_war" => Self::ADD_WAR,
            "delete_war" => Self::DELETE_WAR,
            "manage_team" => Self::MANAGE_TEAM,
            "manage_call_sign" => Self::MANAGE_CALL_SIGN,
            _ => return None,
        };
        Some(permission)
    }

    /// List the codenames of every set flag
    pub fn list(&self) -> Vec<&'static str> {
        const CODENAMES: &[(GuildPermissions, &str)] = &[
            (GuildPermissions::VIEW_OVERVIEW, "view_overview"),
            (GuildPermissions::VIEW_MEMBERS, "view_members"),
            (GuildPermissions::VIEW_HISTORY, "view_history"),
            (GuildPermissions::VIEW_WAR, "view_war"),
            (GuildPermissions::VIEW_ACTIVITY_LOG, "view_activity_log"),
            (GuildPermissions::CHANGE_GUILD_INFO, "change_guild_info"),
            (
                GuildPermissions::CHANGE_GUILD_INTEGRATION,
                "change_guild_integration",
            ),
            (
                GuildPermissions::CHANGE_MEMBER_ATTENDANCE,
                "change_member_attendance",
            ),
            (
                GuildPermissions::CHANGE_MY_ATTENDANCE,
                "change_my_attendance",
            ),
            (GuildPermissions::CHANGE_WAR, "change_war"),
            (GuildPermissions::ADD_WAR, "add_war"),
            (GuildPermissions::DELETE_WAR, "delete_war"),
            (GuildPermissions::MANAGE_TEAM, "manage_team"),
            (GuildPermissions::MANAGE_CALL_SIGN, "manage_call_sign"),
        ];

        CODENAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl fmt::Display for GuildPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.list().join(", "))
    }
}

// Serialized as a decimal string so JavaScript clients keep full precision
impl Serialize for GuildPermissions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.bits().to_string())
    }
}

impl<'de> Deserialize<'de> for GuildPermissions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<u64>()
            .map(GuildPermissions::from_bits_truncate)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_defaults() {
        let perms = GuildPermissions::MEMBER;
        assert!(perms.has(GuildPermissions::VIEW_WAR));
        assert!(perms.has(GuildPermissions::CHANGE_MY_ATTENDANCE));
        assert!(!perms.has(GuildPermissions::MANAGE_TEAM));
        assert!(!perms.has(GuildPermissions::DELETE_WAR));
    }

    #[test]
    fn test_officer_includes_member() {
        assert!(GuildPermissions::OFFICER.contains(GuildPermissions::MEMBER));
        assert!(GuildPermissions::OFFICER.has(GuildPermissions::MANAGE_CALL_SIGN));
    }

    #[test]
    fn test_from_codename() {
        assert_eq!(
            GuildPermissions::from_codename("manage_team"),
            Some(GuildPermissions::MANAGE_TEAM)
        );
        assert_eq!(GuildPermissions::from_codename("fly_dragon"), None);
    }

    #[test]
    fn test_codename_roundtrip() {
        for codename in GuildPermissions::ALL.list() {
            let perm = GuildPermissions::from_codename(codename).unwrap();
            assert_eq!(perm.list(), vec![codename]);
        }
    }

    #[test]
    fn test_i64_roundtrip() {
        let perms = GuildPermissions::OFFICER;
        assert_eq!(GuildPermissions::from_i64(perms.to_i64()), perms);
    }

    #[test]
    fn test_combine() {
        let combined = GuildPermissions::combine([
            GuildPermissions::VIEW_WAR,
            GuildPermissions::MANAGE_TEAM,
        ]);
        assert!(combined.has(GuildPermissions::VIEW_WAR));
        assert!(combined.has(GuildPermissions::MANAGE_TEAM));
        assert!(!combined.has(GuildPermissions::ADD_WAR));
    }
}
