//! Profile entity <-> model mapper

use std::collections::HashMap;

use warband_core::entities::Profile;
use warband_core::value_objects::{AvailabilityMap, Snowflake};

use crate::models::ProfileModel;

impl From<ProfileModel> for Profile {
    fn from(model: ProfileModel) -> Self {
        let raw: HashMap<String, i16> =
            serde_json::from_value(model.availability).unwrap_or_default();

        Profile {
            id: Snowflake::new(model.id),
            family_name: model.family_name,
            external_id: model.external_id,
            availability: AvailabilityMap::from_day_map(&raw),
            auto_sign_up: model.auto_sign_up,
        }
    }
}

/// JSONB value for the availability column
pub fn availability_to_json(availability: &AvailabilityMap) -> serde_json::Value {
    serde_json::to_value(availability.to_day_map())
        .unwrap_or(serde_json::Value::Object(serde_json::Map::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use warband_core::value_objects::AvailabilityStatus;

    #[test]
    fn test_availability_decodes_and_sanitizes() {
        let model = ProfileModel {
            id: 1,
            family_name: "Aldebaran".to_string(),
            external_id: None,
            availability: serde_json::json!({ "Saturday": 0, "Caturday": 1 }),
            auto_sign_up: true,
        };
        let profile = Profile::from(model);
        assert_eq!(
            profile.availability.get(Weekday::Sat),
            AvailabilityStatus::Attending
        );
        assert_eq!(
            profile.availability.get(Weekday::Mon),
            AvailabilityStatus::Undecided
        );
    }

    #[test]
    fn test_availability_json_roundtrip() {
        let mut availability = AvailabilityMap::new();
        availability.set(Weekday::Fri, AvailabilityStatus::NotAttending);

        let json = availability_to_json(&availability);
        let raw: HashMap<String, i16> = serde_json::from_value(json).unwrap();
        assert_eq!(AvailabilityMap::from_day_map(&raw), availability);
    }
}
