//! Player profile entity

use chrono::{DateTime, Datelike, Duration, Utc};
use chrono_tz::Tz;

use crate::entities::attendance::AttendanceStatus;
use crate::value_objects::{AvailabilityMap, AvailabilityStatus, Snowflake};

/// A player, independent of any guild. May belong to multiple guilds.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: Snowflake,
    /// Unique display name (case-insensitive unique in storage)
    pub family_name: String,
    /// Identity in the external roster source, when linked
    pub external_id: Option<String>,
    pub availability: AvailabilityMap,
    /// When enabled (and a main character exists), attendance generation
    /// reads the availability map instead of defaulting to undecided
    pub auto_sign_up: bool,
}

impl Profile {
    /// Attendance intent for a war at `date`, given whether the player has a
    /// designated main character.
    ///
    /// The weekday is taken from the evening before the war date in the
    /// guild's timezone: wars roll over midnight in most regions, so a war
    /// timestamped Sunday 00:30 belongs to the Saturday slot.
    pub fn war_intent(&self, date: DateTime<Utc>, tz: Tz, has_main: bool) -> AttendanceStatus {
        if !has_main || !self.auto_sign_up {
            return AttendanceStatus::Undecided;
        }

        let weekday = (date.with_timezone(&tz) - Duration::days(1)).weekday();
        match self.availability.get(weekday) {
            AvailabilityStatus::Attending => AttendanceStatus::Attending,
            AvailabilityStatus::NotAttending => AttendanceStatus::NotAttending,
            AvailabilityStatus::Undecided => AttendanceStatus::Undecided,
        }
    }
}
