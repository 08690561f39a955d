//! Reminder service
//!
//! Periodic sweep that sends each guild's pre-war reminder once the
//! configured lead time is reached. Callers drive it on an interval; a
//! reminder is marked sent only after delivery succeeds, so a failed
//! delivery retries on the next sweep.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};

use warband_core::value_objects::Snowflake;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Reminder service
pub struct ReminderService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ReminderService<'a> {
    /// Create a new ReminderService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Run one reminder sweep; returns the number of reminders sent
    #[instrument(skip(self))]
    pub async fn run_once(&self, now: DateTime<Utc>) -> ServiceResult<usize> {
        let due = self
            .ctx
            .war_repo()
            .find_due_reminders(now, now + Duration::days(1))
            .await?;

        let mut sent = 0;
        for war in &due {
            let Some(guild) = self.ctx.guild_repo().find_by_id(war.guild_id).await? else {
                continue;
            };
            if !guild.reminders_enabled() {
                continue;
            }

            let minutes_left = (war.date - now).num_minutes();
            if minutes_left > i64::from(guild.integration.reminder_minutes) {
                continue;
            }

            if let Err(e) = self.ctx.notifier().remind_war(&guild, war).await {
                warn!(war_id = %war.id, error = %e, "Reminder delivery failed");
                continue;
            }
            self.ctx.war_repo().mark_reminder_sent(war.id).await?;
            sent += 1;

            info!(war_id = %war.id, guild_id = %guild.id, minutes_left, "Reminder sent");
        }

        Ok(sent)
    }

    /// Send one war's reminder immediately, bypassing the lead-time check
    #[instrument(skip(self))]
    pub async fn send_now(&self, war_id: Snowflake) -> ServiceResult<()> {
        let war = self
            .ctx
            .war_repo()
            .find_by_id(war_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("War", war_id.to_string()))?;
        let guild = self
            .ctx
            .guild_repo()
            .find_by_id(war.guild_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Guild", war.guild_id.to_string()))?;

        self.ctx.notifier().remind_war(&guild, &war).await?;
        self.ctx.war_repo().mark_reminder_sent(war_id).await?;
        Ok(())
    }
}
