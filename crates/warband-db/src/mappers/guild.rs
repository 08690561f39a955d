//! Guild entity <-> model mapper

use std::collections::HashMap;

use warband_core::entities::{Guild, GuildIntegration, NotificationToggles};
use warband_core::value_objects::Snowflake;

use crate::models::GuildModel;

/// Convert GuildModel to Guild entity
///
/// The JSONB columns are sanitized: entries that fail to decode are dropped
/// rather than failing the whole row.
pub fn guild_from_model(model: GuildModel) -> Guild {
    let role_map: HashMap<Snowflake, String> =
        serde_json::from_value(model.role_map).unwrap_or_default();
    let member_cache: HashMap<String, Snowflake> =
        serde_json::from_value(model.member_cache).unwrap_or_default();

    Guild {
        id: Snowflake::new(model.id),
        name: model.name,
        description: model.description,
        logo_url: model.logo_url,
        region: model.region,
        war_start_time: model.war_start_time,
        integration: GuildIntegration {
            external_id: model.external_id,
            webhook_url: model.webhook_url,
            notifications: NotificationToggles {
                war_create: model.notify_war_create,
                war_cancel: model.notify_war_cancel,
                war_end: model.notify_war_end,
            },
            reminder_minutes: model.reminder_minutes,
            role_map,
            member_cache,
        },
    }
}

/// JSONB values for the integration mapping columns
pub fn integration_to_json(
    integration: &GuildIntegration,
) -> (serde_json::Value, serde_json::Value) {
    let role_map =
        serde_json::to_value(&integration.role_map).unwrap_or(serde_json::Value::Object(
            serde_json::Map::new(),
        ));
    let member_cache =
        serde_json::to_value(&integration.member_cache).unwrap_or(serde_json::Value::Object(
            serde_json::Map::new(),
        ));
    (role_map, member_cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn model() -> GuildModel {
        GuildModel {
            id: 1,
            name: "Remnants".to_string(),
            description: String::new(),
            logo_url: None,
            region: "Europe/Berlin".to_string(),
            war_start_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            external_id: Some("g-123".to_string()),
            webhook_url: None,
            notify_war_create: true,
            notify_war_cancel: true,
            notify_war_end: false,
            reminder_minutes: 30,
            role_map: serde_json::json!({ "7": "Officer" }),
            member_cache: serde_json::json!({ "u-1": "7" }),
        }
    }

    #[test]
    fn test_json_columns_decode() {
        let guild = guild_from_model(model());
        assert_eq!(
            guild.integration.role_map.get(&Snowflake::new(7)),
            Some(&"Officer".to_string())
        );
        assert_eq!(
            guild.integration.member_cache.get("u-1"),
            Some(&Snowflake::new(7))
        );
        assert!(!guild.integration.notifications.war_end);
    }

    #[test]
    fn test_corrupt_json_falls_back_to_empty() {
        let mut m = model();
        m.role_map = serde_json::json!("not a map");
        let guild = guild_from_model(m);
        assert!(guild.integration.role_map.is_empty());
    }

    #[test]
    fn test_integration_to_json_roundtrip() {
        let guild = guild_from_model(model());
        let (role_map, member_cache) = integration_to_json(&guild.integration);
        let mut m = model();
        m.role_map = role_map;
        m.member_cache = member_cache;
        let back = guild_from_model(m);
        assert_eq!(back.integration.role_map, guild.integration.role_map);
        assert_eq!(back.integration.member_cache, guild.integration.member_cache);
    }
}
