//! War service
//!
//! Handles the war lifecycle up to finalization: scheduling, setup edits,
//! cancellation, and attendance roster generation.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::{info, instrument, warn};
use validator::Validate;

use warband_core::entities::{
    Activity, ActivityKind, AttendanceStatus, Guild, War, WarAttendance, WarCallSign, WarNode,
    WarTeam,
};
use warband_core::error::DomainError;
use warband_core::events::WarEvent;
use warband_core::value_objects::{GuildPermissions, Snowflake};

use crate::dto::{AttendanceResponse, CreateWarRequest, UpdateWarRequest, WarResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::permission::PermissionService;

/// War service
pub struct WarService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> WarService<'a> {
    /// Create a new WarService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Schedule a new war and generate its attendance roster
    #[instrument(skip(self, request))]
    pub async fn create_war(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
        request: CreateWarRequest,
    ) -> ServiceResult<WarResponse> {
        request.validate()?;
        PermissionService::new(self.ctx)
            .require_permission(guild_id, actor_id, GuildPermissions::ADD_WAR)
            .await?;

        let guild = self.load_guild(guild_id).await?;

        if self.ctx.war_repo().find_pending(guild_id).await?.is_some() {
            return Err(ServiceError::conflict("Guild already has a pending war"));
        }

        let date = war_start(&guild, request.date)?;
        let war = War {
            id: self.ctx.generate_id(),
            guild_id,
            date,
            node: build_node(request.node_name, request.node_tier),
            outcome: None,
            note: request.note,
            reminder_sent: false,
        };

        self.ctx.war_repo().create(&war).await?;
        self.generate_attendance(&guild, &war).await?;

        if request.copy_previous_setup {
            self.copy_previous_setup(&war).await?;
        }

        self.record_activity(
            guild_id,
            Some(actor_id),
            ActivityKind::WarCreate,
            Some(request.date.to_string()),
        )
        .await?;

        info!(war_id = %war.id, guild_id = %guild_id, "War scheduled");

        self.notify(&guild, &war, WarEvent::Start).await;

        Ok(WarResponse::from(&war))
    }

    /// Get war by ID
    #[instrument(skip(self))]
    pub async fn get_war(&self, war_id: Snowflake) -> ServiceResult<WarResponse> {
        let war = self.load_war(war_id).await?;
        Ok(WarResponse::from(&war))
    }

    /// List a guild's wars, newest first
    #[instrument(skip(self))]
    pub async fn list_wars(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
        limit: i64,
    ) -> ServiceResult<Vec<WarResponse>> {
        PermissionService::new(self.ctx)
            .require_permission(guild_id, actor_id, GuildPermissions::VIEW_HISTORY)
            .await?;

        let wars = self.ctx.war_repo().find_by_guild(guild_id, limit).await?;
        Ok(wars.iter().map(WarResponse::from).collect())
    }

    /// Update a pending war's date, node, and note
    #[instrument(skip(self, request))]
    pub async fn update_war(
        &self,
        war_id: Snowflake,
        actor_id: Snowflake,
        request: UpdateWarRequest,
    ) -> ServiceResult<WarResponse> {
        request.validate()?;
        let mut war = self.load_war(war_id).await?;
        PermissionService::new(self.ctx)
            .require_permission(war.guild_id, actor_id, GuildPermissions::CHANGE_WAR)
            .await?;

        if !war.is_pending() {
            return Err(DomainError::WarFinishedImmutable.into());
        }

        let guild = self.load_guild(war.guild_id).await?;

        if let Some(date) = request.date {
            war.date = war_start(&guild, date)?;
        }
        if request.node_name.is_some() || request.node_tier.is_some() {
            war.node = build_node(request.node_name, request.node_tier);
        }
        if let Some(note) = request.note {
            war.note = Some(note);
        }

        self.ctx.war_repo().update(&war).await?;
        self.record_activity(war.guild_id, Some(actor_id), ActivityKind::WarUpdate, None)
            .await?;

        Ok(WarResponse::from(&war))
    }

    /// Cancel a pending war
    #[instrument(skip(self))]
    pub async fn delete_war(&self, war_id: Snowflake, actor_id: Snowflake) -> ServiceResult<()> {
        let war = self.load_war(war_id).await?;
        PermissionService::new(self.ctx)
            .require_permission(war.guild_id, actor_id, GuildPermissions::DELETE_WAR)
            .await?;

        if !war.is_pending() {
            return Err(DomainError::WarFinishedImmutable.into());
        }

        let guild = self.load_guild(war.guild_id).await?;

        self.ctx.war_repo().delete(war_id).await?;
        self.record_activity(war.guild_id, Some(actor_id), ActivityKind::WarDelete, None)
            .await?;

        info!(war_id = %war_id, guild_id = %war.guild_id, "War cancelled");

        self.notify(&guild, &war, WarEvent::Cancelled).await;

        Ok(())
    }

    /// List the attendance roster of a war
    #[instrument(skip(self))]
    pub async fn list_attendance(
        &self,
        war_id: Snowflake,
        actor_id: Snowflake,
    ) -> ServiceResult<Vec<AttendanceResponse>> {
        let war = self.load_war(war_id).await?;
        PermissionService::new(self.ctx)
            .require_permission(war.guild_id, actor_id, GuildPermissions::VIEW_WAR)
            .await?;

        let rows = self.ctx.attendance_repo().find_by_war(war_id).await?;
        Ok(rows.iter().map(AttendanceResponse::from).collect())
    }

    /// Generate one attendance row per guild member
    ///
    /// Intent comes from each profile's availability map when auto sign-up is
    /// on and a main character exists; the main is snapshotted onto the row
    /// for auto-attending players.
    #[instrument(skip(self, guild, war), fields(war_id = %war.id))]
    pub async fn generate_attendance(&self, guild: &Guild, war: &War) -> ServiceResult<usize> {
        if self.ctx.attendance_repo().exists_for_war(war.id).await? {
            return Err(DomainError::AttendanceAlreadyGenerated.into());
        }

        let tz = guild.timezone()?;
        let members = self.ctx.member_repo().find_by_guild(guild.id).await?;
        let mut rows = Vec::with_capacity(members.len());

        for member in &members {
            let Some(profile) = self
                .ctx
                .profile_repo()
                .find_by_id(member.user_profile_id)
                .await?
            else {
                continue;
            };
            let main = self.ctx.character_repo().find_main(profile.id).await?;

            let status = profile.war_intent(war.date, tz, main.is_some());
            let mut row = WarAttendance::new(self.ctx.generate_id(), war.id, profile.id, status);
            if status == AttendanceStatus::Attending {
                row.character_id = main.map(|c| c.id);
            }
            rows.push(row);
        }

        self.ctx.attendance_repo().create_many(&rows).await?;

        info!(war_id = %war.id, count = rows.len(), "Attendance roster generated");

        Ok(rows.len())
    }

    /// Clone team and call-sign shells from the guild's last finished war
    async fn copy_previous_setup(&self, war: &War) -> ServiceResult<()> {
        let Some(previous) = self
            .ctx
            .war_repo()
            .find_latest_finished(war.guild_id)
            .await?
        else {
            return Ok(());
        };

        let teams = self.ctx.team_repo().find_by_war(previous.id).await?;
        for team in &teams {
            let clone = WarTeam {
                id: self.ctx.generate_id(),
                war_id: war.id,
                name: team.name.clone(),
                kind: team.kind,
                slot_setup: team.slot_setup.clone(),
                default_role_id: team.default_role_id,
            };
            self.ctx.team_repo().create(&clone).await?;
        }

        let call_signs = self.ctx.call_sign_repo().find_by_war(previous.id).await?;
        for call_sign in &call_signs {
            let clone = WarCallSign {
                id: self.ctx.generate_id(),
                war_id: war.id,
                name: call_sign.name.clone(),
            };
            self.ctx.call_sign_repo().create(&clone).await?;
        }

        info!(
            war_id = %war.id,
            from = %previous.id,
            teams = teams.len(),
            call_signs = call_signs.len(),
            "Setup copied from previous war"
        );

        Ok(())
    }

    /// Deliver a war notification; delivery failures never fail the caller
    async fn notify(&self, guild: &Guild, war: &War, event: WarEvent) {
        if !guild.notifies(event) {
            return;
        }
        if let Err(e) = self.ctx.notifier().notify_war(guild, war, event).await {
            warn!(war_id = %war.id, event = event.as_str(), error = %e, "Notification failed");
        }
    }

    async fn load_guild(&self, guild_id: Snowflake) -> ServiceResult<Guild> {
        self.ctx
            .guild_repo()
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Guild", guild_id.to_string()))
    }

    async fn load_war(&self, war_id: Snowflake) -> ServiceResult<War> {
        self.ctx
            .war_repo()
            .find_by_id(war_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("War", war_id.to_string()))
    }

    async fn record_activity(
        &self,
        guild_id: Snowflake,
        actor_id: Option<Snowflake>,
        kind: ActivityKind,
        detail: Option<String>,
    ) -> ServiceResult<()> {
        let activity = Activity::new(self.ctx.generate_id(), guild_id, actor_id, kind, detail);
        self.ctx.activity_repo().create(&activity).await?;
        Ok(())
    }
}

/// Normalize a calendar day to the guild's war start instant in UTC
fn war_start(guild: &Guild, date: NaiveDate) -> ServiceResult<DateTime<Utc>> {
    let tz = guild.timezone()?;
    let local = date.and_time(guild.war_start_time);
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            ServiceError::validation(format!(
                "War start {local} does not exist in {}",
                guild.region
            ))
        })
}

fn build_node(name: Option<String>, tier: Option<i16>) -> Option<WarNode> {
    name.map(|name| WarNode {
        name,
        tier: tier.unwrap_or(1),
    })
}
