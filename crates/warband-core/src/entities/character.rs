//! Character entity - a playable character owned by a profile

use crate::value_objects::Snowflake;

/// In-game character. A profile may own several; at most one is the main,
/// and the main is what attendance generation snapshots onto the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub id: Snowflake,
    pub profile_id: Snowflake,
    pub name: String,
    pub class_name: String,
    pub level: i32,
    pub is_main: bool,
}

impl Character {
    /// Check ownership against a profile id
    #[inline]
    pub fn belongs_to(&self, profile_id: Snowflake) -> bool {
        self.profile_id == profile_id
    }
}
