//! War teams, call signs, and war roles - coordination groupings within a war

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// A battlefield role referenced by team slot setups (e.g. Shotcaller, Flex)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarRole {
    pub id: Snowflake,
    pub name: String,
}

/// Team flavor, which bounds the slot count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamKind {
    Platoon,
    Party,
}

impl TeamKind {
    /// Highest valid slot index (slots are 1-based)
    #[inline]
    pub fn max_slots(self) -> u16 {
        match self {
            Self::Platoon => 20,
            Self::Party => 5,
        }
    }

    pub fn as_i16(self) -> i16 {
        match self {
            Self::Platoon => 0,
            Self::Party => 1,
        }
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(Self::Platoon),
            1 => Some(Self::Party),
            _ => None,
        }
    }
}

/// A named, slot-structured team scoped to one war
///
/// Slot membership itself lives in a join table keyed unique on (team, slot)
/// and unique on attendee; this entity carries the shell that is cloned from
/// war to war (name, kind, slot setup, default role).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarTeam {
    pub id: Snowflake,
    pub war_id: Snowflake,
    pub name: String,
    pub kind: TeamKind,
    /// Slot index -> war role override; slots absent here use `default_role_id`
    pub slot_setup: HashMap<u16, Snowflake>,
    pub default_role_id: Snowflake,
}

impl WarTeam {
    /// Validate a 1-based slot index against the team kind
    pub fn check_slot(&self, slot: u16) -> Result<(), DomainError> {
        if slot < 1 || slot > self.kind.max_slots() {
            return Err(DomainError::InvalidSlot {
                slot,
                max: self.kind.max_slots(),
            });
        }
        Ok(())
    }

    /// Role assigned to a slot, falling back to the team default
    pub fn role_for_slot(&self, slot: u16) -> Snowflake {
        self.slot_setup
            .get(&slot)
            .copied()
            .unwrap_or(self.default_role_id)
    }
}

/// A named, free-form attendee grouping scoped to one war
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarCallSign {
    pub id: Snowflake,
    pub war_id: Snowflake,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(kind: TeamKind) -> WarTeam {
        WarTeam {
            id: Snowflake::new(1),
            war_id: Snowflake::new(2),
            name: "Alpha".to_string(),
            kind,
            slot_setup: HashMap::new(),
            default_role_id: Snowflake::new(9),
        }
    }

    #[test]
    fn test_slot_bounds() {
        let platoon = team(TeamKind::Platoon);
        assert!(platoon.check_slot(1).is_ok());
        assert!(platoon.check_slot(20).is_ok());
        assert!(platoon.check_slot(0).is_err());
        assert!(platoon.check_slot(21).is_err());

        let party = team(TeamKind::Party);
        assert!(party.check_slot(5).is_ok());
        assert!(party.check_slot(6).is_err());
    }

    #[test]
    fn test_role_for_slot_falls_back_to_default() {
        let mut t = team(TeamKind::Party);
        t.slot_setup.insert(2, Snowflake::new(55));
        assert_eq!(t.role_for_slot(2), Snowflake::new(55));
        assert_eq!(t.role_for_slot(3), Snowflake::new(9));
    }

    #[test]
    fn test_kind_i16_roundtrip() {
        assert_eq!(TeamKind::from_i16(0), Some(TeamKind::Platoon));
        assert_eq!(TeamKind::from_i16(1), Some(TeamKind::Party));
        assert_eq!(TeamKind::from_i16(2), None);
    }
}
