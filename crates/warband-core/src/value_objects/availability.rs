//! Weekly availability for auto sign-up
//!
//! Players can record a per-weekday availability status. When auto sign-up is
//! enabled and the player has a main character, attendance generation reads
//! the weekday slot for the war date instead of defaulting to undecided.

use std::collections::HashMap;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Self-reported availability for a weekday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Attending,
    NotAttending,
    #[default]
    Undecided,
}

impl AvailabilityStatus {
    /// Convert to the integer representation used in storage
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Attending => 0,
            Self::NotAttending => 1,
            Self::Undecided => 2,
        }
    }

    /// Convert from the integer representation; unknown values are rejected
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(Self::Attending),
            1 => Some(Self::NotAttending),
            2 => Some(Self::Undecided),
            _ => None,
        }
    }
}

/// Typed weekday -> availability mapping
///
/// Stored as a JSON document keyed by English day names; validated at the
/// boundary so invalid days or statuses never reach domain code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AvailabilityMap {
    days: HashMap<Weekday, AvailabilityStatus>,
}

impl AvailabilityMap {
    /// Empty map: every weekday reads as undecided
    pub fn new() -> Self {
        Self::default()
    }

    /// Status for a weekday, defaulting to undecided when unset
    pub fn get(&self, day: Weekday) -> AvailabilityStatus {
        self.days.get(&day).copied().unwrap_or_default()
    }

    /// Set the status for a weekday
    pub fn set(&mut self, day: Weekday, status: AvailabilityStatus) {
        self.days.insert(day, status);
    }

    /// Build from a day-name document, silently dropping invalid entries
    /// (mirrors how profile persistence sanitizes the stored blob)
    pub fn from_day_map(raw: &HashMap<String, i16>) -> Self {
        let mut map = Self::new();
        for (day_name, value) in raw {
            let Some(day) = parse_day(day_name) else {
                continue;
            };
            let Some(status) = AvailabilityStatus::from_i16(*value) else {
                continue;
            };
            map.set(day, status);
        }
        map
    }

    /// Serialize to the day-name document used in storage
    pub fn to_day_map(&self) -> HashMap<String, i16> {
        self.days
            .iter()
            .map(|(day, status)| (day_name(*day).to_string(), status.as_i16()))
            .collect()
    }
}

fn parse_day(name: &str) -> Option<Weekday> {
    match name {
        "Monday" => Some(Weekday::Mon),
        "Tuesday" => Some(Weekday::Tue),
        "Wednesday" => Some(Weekday::Wed),
        "Thursday" => Some(Weekday::Thu),
        "Friday" => Some(Weekday::Fri),
        "Saturday" => Some(Weekday::Sat),
        "Sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_undecided() {
        let map = AvailabilityMap::new();
        assert_eq!(map.get(Weekday::Wed), AvailabilityStatus::Undecided);
    }

    #[test]
    fn test_set_and_get() {
        let mut map = AvailabilityMap::new();
        map.set(Weekday::Sat, AvailabilityStatus::Attending);
        assert_eq!(map.get(Weekday::Sat), AvailabilityStatus::Attending);
        assert_eq!(map.get(Weekday::Sun), AvailabilityStatus::Undecided);
    }

    #[test]
    fn test_from_day_map_drops_invalid_entries() {
        let mut raw = HashMap::new();
        raw.insert("Saturday".to_string(), 0);
        raw.insert("Caturday".to_string(), 0);
        raw.insert("Monday".to_string(), 9);

        let map = AvailabilityMap::from_day_map(&raw);
        assert_eq!(map.get(Weekday::Sat), AvailabilityStatus::Attending);
        assert_eq!(map.get(Weekday::Mon), AvailabilityStatus::Undecided);
    }

    #[test]
    fn test_day_map_roundtrip() {
        let mut map = AvailabilityMap::new();
        map.set(Weekday::Fri, AvailabilityStatus::NotAttending);
        map.set(Weekday::Sun, AvailabilityStatus::Attending);

        let back = AvailabilityMap::from_day_map(&map.to_day_map());
        assert_eq!(back, map);
    }
}
