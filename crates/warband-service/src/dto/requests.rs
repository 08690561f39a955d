//! Request DTOs
//!
//! All mutating requests are validated with `validator` before any
//! repository is touched. Snowflake ids deserialize from strings or numbers.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use validator::Validate;

use warband_core::entities::{StatCounters, TeamKind, WarOutcome};
use warband_core::value_objects::Snowflake;

// ============================================================================
// Guild Requests
// ============================================================================

/// Create guild request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGuildRequest {
    #[validate(length(min = 2, max = 64, message = "Guild name must be 2-64 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    #[serde(default)]
    pub description: String,

    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,

    /// IANA timezone name, e.g. "America/New_York"
    pub region: String,

    /// Local time of day wars start at; defaults to 20:00 when omitted
    pub war_start_time: Option<NaiveTime>,
}

/// Update guild request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateGuildRequest {
    #[validate(length(min = 2, max = 64, message = "Guild name must be 2-64 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,

    pub war_start_time: Option<NaiveTime>,
}

/// Update guild integration settings request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateIntegrationRequest {
    pub external_id: Option<String>,

    #[validate(url(message = "Webhook URL must be a valid URL"))]
    pub webhook_url: Option<String>,

    pub notify_war_create: Option<bool>,
    pub notify_war_cancel: Option<bool>,
    pub notify_war_end: Option<bool>,

    /// Minutes before war start to send a reminder; -1 disables
    #[validate(range(min = -1, max = 1440, message = "Reminder must be -1 to 1440 minutes"))]
    pub reminder_minutes: Option<i32>,

    /// Local role id -> external role name
    pub role_map: Option<HashMap<Snowflake, String>>,
}

// ============================================================================
// Profile Requests
// ============================================================================

/// Create profile request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProfileRequest {
    #[validate(length(min = 2, max = 64, message = "Family name must be 2-64 characters"))]
    pub family_name: String,

    pub external_id: Option<String>,
}

/// Update profile request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    /// Day-name -> availability status document (0/1/2)
    pub availability: Option<HashMap<String, i16>>,
    pub auto_sign_up: Option<bool>,
}

/// Create character request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCharacterRequest {
    #[validate(length(min = 2, max = 64, message = "Character name must be 2-64 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 32, message = "Class name must be 1-32 characters"))]
    pub class_name: String,

    #[validate(range(min = 1, max = 100, message = "Level must be 1-100"))]
    pub level: i32,
}

/// Update character request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCharacterRequest {
    #[validate(length(min = 2, max = 64, message = "Character name must be 2-64 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 32, message = "Class name must be 1-32 characters"))]
    pub class_name: Option<String>,

    #[validate(range(min = 1, max = 100, message = "Level must be 1-100"))]
    pub level: Option<i32>,

    pub is_main: Option<bool>,
}

// ============================================================================
// War Requests
// ============================================================================

/// Create war request
///
/// The date is a calendar day; the service normalizes it to the guild's
/// configured war start time in the guild's region timezone.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWarRequest {
    pub date: NaiveDate,

    #[validate(length(max = 64, message = "Node name must be at most 64 characters"))]
    pub node_name: Option<String>,

    #[validate(range(min = 1, max = 4, message = "Node tier must be 1-4"))]
    pub node_tier: Option<i16>,

    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,

    /// Clone team and call-sign shells from the guild's last finished war
    #[serde(default)]
    pub copy_previous_setup: bool,
}

/// Update a pending war's setup
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateWarRequest {
    pub date: Option<NaiveDate>,

    #[validate(length(max = 64, message = "Node name must be at most 64 characters"))]
    pub node_name: Option<String>,

    #[validate(range(min = 1, max = 4, message = "Node tier must be 1-4"))]
    pub node_tier: Option<i16>,

    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,
}

// ============================================================================
// Attendance Requests
// ============================================================================

/// Self-service attendance create/update
///
/// Only the intent statuses (0 attending, 1 not attending, 2 undecided) are
/// accepted here; the reconciled statuses are assigned at finalization.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SetAttendanceRequest {
    pub status: Option<i16>,

    pub character_id: Option<Snowflake>,

    #[validate(length(max = 255, message = "Note must be at most 255 characters"))]
    pub note: Option<String>,
}

// ============================================================================
// Team and Call Sign Requests
// ============================================================================

/// Create team request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 64, message = "Team name must be 1-64 characters"))]
    pub name: String,

    pub kind: TeamKind,

    pub default_role_id: Snowflake,

    /// Slot index -> war role override
    #[serde(default)]
    pub slot_setup: HashMap<u16, Snowflake>,
}

/// Update team request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTeamRequest {
    #[validate(length(min = 1, max = 64, message = "Team name must be 1-64 characters"))]
    pub name: Option<String>,

    pub default_role_id: Option<Snowflake>,

    pub slot_setup: Option<HashMap<u16, Snowflake>>,
}

/// Assign or clear a team slot
#[derive(Debug, Clone, Deserialize)]
pub struct SetSlotRequest {
    /// 1-based slot index
    pub slot: u16,

    /// Attendee to place; `None` clears the slot
    pub attendance_id: Option<Snowflake>,
}

/// Create call sign request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCallSignRequest {
    #[validate(length(min = 1, max = 64, message = "Call sign name must be 1-64 characters"))]
    pub name: String,
}

// ============================================================================
// Finalization Requests
// ============================================================================

/// One attendee's end-of-war stat line
///
/// Referenced by attendance id when the row is known; revision entries for
/// players added after the fact resolve through the family name instead.
#[derive(Debug, Clone, Deserialize)]
pub struct WarStatEntry {
    pub attendance_id: Option<Snowflake>,
    pub family_name: Option<String>,
    #[serde(flatten)]
    pub counters: StatCounters,
}

/// Finish a pending war
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FinishWarRequest {
    pub outcome: WarOutcome,

    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,

    /// Stat lines for everyone who fought
    pub entries: Vec<WarStatEntry>,
}

/// Revise a finished war's stats
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateFinishedWarRequest {
    pub outcome: Option<WarOutcome>,

    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,

    /// Complete replacement stat lines; stats absent from this list are
    /// treated as removed and their attendee marked a no-show
    pub entries: Vec<WarStatEntry>,
}

// ============================================================================
// Roster Sync Requests
// ============================================================================

/// Snapshot of the external roster, as pulled from the integration source
#[derive(Debug, Clone, Deserialize)]
pub struct RosterSnapshot {
    /// External member id -> external role ids held
    pub members: HashMap<String, Vec<String>>,

    /// External role id -> role name catalog
    pub roles: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_guild_request_validation() {
        let request = CreateGuildRequest {
            name: "X".to_string(),
            description: String::new(),
            logo_url: None,
            region: "Europe/London".to_string(),
            war_start_time: None,
        };
        assert!(request.validate().is_err());

        let request = CreateGuildRequest {
            name: "Remnants".to_string(),
            ..request
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_stat_entry_flattens_counters() {
        let json = r#"{"attendance_id": "7", "member": 12, "death": 3}"#;
        let entry: WarStatEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.attendance_id, Some(Snowflake::new(7)));
        assert_eq!(entry.counters.member, 12);
        assert_eq!(entry.counters.death, 3);
        assert_eq!(entry.counters.fort, 0);
    }

    #[test]
    fn test_reminder_minutes_range() {
        let request = UpdateIntegrationRequest {
            reminder_minutes: Some(-5),
            ..UpdateIntegrationRequest::default()
        };
        assert!(request.validate().is_err());

        let request = UpdateIntegrationRequest {
            reminder_minutes: Some(-1),
            ..UpdateIntegrationRequest::default()
        };
        assert!(request.validate().is_ok());
    }
}
