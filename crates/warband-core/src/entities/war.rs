//! War entity - a single scheduled competitive event for a guild

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Outcome of a finished war. `None` on the entity means the war is still
/// pending; setting an outcome is the one-way finalization transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarOutcome {
    Win,
    Loss,
    Stalemate,
}

impl WarOutcome {
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Win => 0,
            Self::Loss => 1,
            Self::Stalemate => 2,
        }
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(Self::Win),
            1 => Some(Self::Loss),
            2 => Some(Self::Stalemate),
            _ => None,
        }
    }
}

/// Battle location metadata attached to a war
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarNode {
    pub name: String,
    pub tier: i16,
}

/// War entity
#[derive(Debug, Clone, PartialEq)]
pub struct War {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    /// Normalized to the guild's configured war start time in its region
    pub date: DateTime<Utc>,
    pub node: Option<WarNode>,
    pub outcome: Option<WarOutcome>,
    pub note: Option<String>,
    /// Set once the pre-war reminder notification went out
    pub reminder_sent: bool,
}

impl War {
    /// A war is pending until an outcome is recorded
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.outcome.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_i16_roundtrip() {
        for outcome in [WarOutcome::Win, WarOutcome::Loss, WarOutcome::Stalemate] {
            assert_eq!(WarOutcome::from_i16(outcome.as_i16()), Some(outcome));
        }
        assert_eq!(WarOutcome::from_i16(7), None);
    }

    #[test]
    fn test_pending_until_outcome_set() {
        let mut war = War {
            id: Snowflake::new(1),
            guild_id: Snowflake::new(2),
            date: Utc::now(),
            node: None,
            outcome: None,
            note: None,
            reminder_sent: false,
        };
        assert!(war.is_pending());

        war.outcome = Some(WarOutcome::Win);
        assert!(!war.is_pending());
    }
}
