//! Domain events - war lifecycle changes worth announcing
//!
//! These events drive outbound notifications (guild webhooks) and the
//! per-guild opt-out toggles. The notification channel itself lives behind
//! the [`crate::traits::NotificationSink`] port.

use serde::{Deserialize, Serialize};

/// War lifecycle events a guild can be notified about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarEvent {
    /// A new war was scheduled
    Start,
    /// A pending war was deleted before it happened
    Cancelled,
    /// A war was finalized with an outcome
    Finished,
}

impl WarEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "war_start",
            Self::Cancelled => "war_cancelled",
            Self::Finished => "war_finished",
        }
    }
}
