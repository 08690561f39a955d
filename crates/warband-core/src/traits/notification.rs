//! Notification port - outbound webhook delivery

use async_trait::async_trait;

use crate::entities::{Guild, War};
use crate::error::DomainError;
use crate::events::WarEvent;

/// Outbound notification channel for guild webhooks
///
/// Implementations deliver to whatever the guild's `webhook_url` points at.
/// Delivery failures are returned, but callers treat them as non-fatal: a
/// dropped notification never rolls back the domain write that caused it.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Announce a war lifecycle event
    async fn notify_war(&self, guild: &Guild, war: &War, event: WarEvent)
        -> Result<(), DomainError>;

    /// Send the pre-war reminder
    async fn remind_war(&self, guild: &Guild, war: &War) -> Result<(), DomainError>;
}
