//! War team and battlefield role entity <-> model mappers

use std::collections::HashMap;

use warband_core::entities::{TeamKind, WarRole, WarTeam};
use warband_core::error::DomainError;
use warband_core::traits::RepoResult;
use warband_core::value_objects::Snowflake;

use crate::models::{TeamModel, WarRoleModel};

/// Convert TeamModel to WarTeam entity
pub fn team_from_model(model: TeamModel) -> RepoResult<WarTeam> {
    let kind = TeamKind::from_i16(model.kind)
        .ok_or_else(|| DomainError::InternalError(format!("bad team kind: {}", model.kind)))?;

    let slot_setup: HashMap<u16, Snowflake> =
        serde_json::from_value(model.slot_setup).unwrap_or_default();

    Ok(WarTeam {
        id: Snowflake::new(model.id),
        war_id: Snowflake::new(model.war_id),
        name: model.name,
        kind,
        slot_setup,
        default_role_id: Snowflake::new(model.default_role_id),
    })
}

/// JSONB value for the slot_setup column
pub fn slot_setup_to_json(slot_setup: &HashMap<u16, Snowflake>) -> serde_json::Value {
    serde_json::to_value(slot_setup).unwrap_or(serde_json::Value::Object(serde_json::Map::new()))
}

impl From<WarRoleModel> for WarRole {
    fn from(model: WarRoleModel) -> Self {
        WarRole {
            id: Snowflake::new(model.id),
            name: model.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_maps_with_slot_setup() {
        let model = TeamModel {
            id: 1,
            war_id: 2,
            name: "Alpha".to_string(),
            kind: 1,
            slot_setup: serde_json::json!({ "2": "55" }),
            default_role_id: 9,
        };
        let team = team_from_model(model).unwrap();
        assert_eq!(team.kind, TeamKind::Party);
        assert_eq!(team.role_for_slot(2), Snowflake::new(55));
        assert_eq!(team.role_for_slot(1), Snowflake::new(9));
    }

    #[test]
    fn test_slot_setup_json_roundtrip() {
        let mut setup = HashMap::new();
        setup.insert(3u16, Snowflake::new(77));
        let json = slot_setup_to_json(&setup);
        let back: HashMap<u16, Snowflake> = serde_json::from_value(json).unwrap();
        assert_eq!(back, setup);
    }
}
