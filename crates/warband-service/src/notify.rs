//! Log-backed notification sink
//!
//! Default [`NotificationSink`] implementation that writes structured log
//! events instead of calling a webhook. Deployments wire a real delivery
//! adapter into the service context; this sink keeps everything working
//! (and observable) without one.

use async_trait::async_trait;
use tracing::info;

use warband_core::entities::{Guild, War};
use warband_core::error::DomainError;
use warband_core::events::WarEvent;
use warband_core::traits::NotificationSink;

/// Notification sink that logs every event it would have delivered
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSink;

impl LogNotificationSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn notify_war(
        &self,
        guild: &Guild,
        war: &War,
        event: WarEvent,
    ) -> Result<(), DomainError> {
        info!(
            guild_id = %guild.id,
            guild = %guild.name,
            war_id = %war.id,
            date = %war.date,
            event = event.as_str(),
            "War notification"
        );
        Ok(())
    }

    async fn remind_war(&self, guild: &Guild, war: &War) -> Result<(), DomainError> {
        info!(
            guild_id = %guild.id,
            guild = %guild.name,
            war_id = %war.id,
            date = %war.date,
            "War reminder"
        );
        Ok(())
    }
}
