//! Guild entity - a player community that schedules wars

use std::collections::HashMap;

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::events::WarEvent;
use crate::value_objects::Snowflake;

/// Guild entity
#[derive(Debug, Clone, PartialEq)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    pub description: String,
    pub logo_url: Option<String>,
    /// IANA timezone name of the guild's home region, e.g. "America/New_York"
    pub region: String,
    /// Local time of day wars start at, in the region timezone
    pub war_start_time: NaiveTime,
    pub integration: GuildIntegration,
}

/// External integration settings (roster source + webhook notifications)
#[derive(Debug, Clone, PartialEq)]
pub struct GuildIntegration {
    /// Guild id in the external roster source, when linked
    pub external_id: Option<String>,
    /// Webhook URL notifications are delivered to
    pub webhook_url: Option<String>,
    pub notifications: NotificationToggles,
    /// Minutes before war start to send a reminder; -1 disables reminders
    pub reminder_minutes: i32,
    /// Local role id -> external role name, consulted during roster sync
    pub role_map: HashMap<Snowflake, String>,
    /// Cached snapshot of external member id -> local role id from the last
    /// sync run; consulted by the login-time refresh path
    pub member_cache: HashMap<String, Snowflake>,
}

impl Default for GuildIntegration {
    fn default() -> Self {
        Self {
            external_id: None,
            webhook_url: None,
            notifications: NotificationToggles::default(),
            reminder_minutes: -1,
            role_map: HashMap::new(),
            member_cache: HashMap::new(),
        }
    }
}

/// Per-event notification opt-outs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationToggles {
    pub war_create: bool,
    pub war_cancel: bool,
    pub war_end: bool,
}

impl Default for NotificationToggles {
    fn default() -> Self {
        Self {
            war_create: true,
            war_cancel: true,
            war_end: true,
        }
    }
}

impl Guild {
    /// Parse the guild's region into a timezone
    pub fn timezone(&self) -> Result<Tz, DomainError> {
        self.region
            .parse::<Tz>()
            .map_err(|_| DomainError::InvalidRegion(self.region.clone()))
    }

    /// Whether the guild wants a notification for the given war event
    pub fn notifies(&self, event: WarEvent) -> bool {
        if self.integration.webhook_url.is_none() {
            return false;
        }
        match event {
            WarEvent::Start => self.integration.notifications.war_create,
            WarEvent::Cancelled => self.integration.notifications.war_cancel,
            WarEvent::Finished => self.integration.notifications.war_end,
        }
    }

    /// Whether reminders are enabled for this guild
    pub fn reminders_enabled(&self) -> bool {
        self.integration.reminder_minutes >= 0 && self.integration.webhook_url.is_some()
    }
}
