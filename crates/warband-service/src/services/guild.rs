//! Guild service
//!
//! Handles guild creation, settings, integration configuration, and the
//! guild activity log.

use chrono::NaiveTime;
use chrono_tz::Tz;
use tracing::{info, instrument};
use validator::Validate;

use warband_core::entities::{
    Activity, ActivityKind, Guild, GuildAggregate, GuildIntegration, GuildMember,
    GUILD_MASTER_ROLE,
};
use warband_core::error::DomainError;
use warband_core::value_objects::{GuildPermissions, Snowflake};

use crate::dto::{
    ActivityResponse, CreateGuildRequest, GuildResponse, MemberResponse, UpdateGuildRequest,
    UpdateIntegrationRequest,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::permission::PermissionService;

/// Guild service
pub struct GuildService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> GuildService<'a> {
    /// Create a new GuildService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a new guild with the actor as its Guild Master
    #[instrument(skip(self, request))]
    pub async fn create_guild(
        &self,
        actor_id: Snowflake,
        request: CreateGuildRequest,
    ) -> ServiceResult<GuildResponse> {
        request.validate()?;

        // Reject unknown regions before anything is written
        request
            .region
            .parse::<Tz>()
            .map_err(|_| DomainError::InvalidRegion(request.region.clone()))?;

        if self
            .ctx
            .guild_repo()
            .name_exists(&request.name, &request.region)
            .await?
        {
            return Err(DomainError::GuildNameExists.into());
        }

        let guild_id = self.ctx.generate_id();
        let guild = Guild {
            id: guild_id,
            name: request.name,
            description: request.description,
            logo_url: request.logo_url,
            region: request.region,
            war_start_time: request
                .war_start_time
                .unwrap_or_else(|| NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default()),
            integration: GuildIntegration::default(),
        };

        self.ctx.guild_repo().create(&guild).await?;

        // The aggregate row exists from day one so finalization can lock it
        let aggregate = GuildAggregate::new(self.ctx.generate_id(), guild_id);
        self.ctx.aggregate_repo().create_guild(&aggregate).await?;

        // The creator holds the protected top role
        let gm_role = self
            .ctx
            .role_repo()
            .find_by_name(GUILD_MASTER_ROLE)
            .await?
            .ok_or_else(|| {
                ServiceError::internal(format!("{GUILD_MASTER_ROLE} role is not seeded"))
            })?;
        let member = GuildMember::new(guild_id, actor_id, gm_role.id);
        self.ctx.member_repo().create(&member).await?;

        self.record_activity(guild_id, Some(actor_id), ActivityKind::GuildCreate, None)
            .await?;

        info!(guild_id = %guild_id, actor_id = %actor_id, "Guild created");

        Ok(GuildResponse::from(&guild))
    }

    /// Get guild by ID
    #[instrument(skip(self))]
    pub async fn get_guild(&self, guild_id: Snowflake) -> ServiceResult<GuildResponse> {
        let guild = self.load_guild(guild_id).await?;
        Ok(GuildResponse::from(&guild))
    }

    /// Get guild entity by ID
    #[instrument(skip(self))]
    pub async fn get_guild_entity(&self, guild_id: Snowflake) -> ServiceResult<Guild> {
        self.load_guild(guild_id).await
    }

    /// Update basic guild information
    #[instrument(skip(self, request))]
    pub async fn update_guild(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
        request: UpdateGuildRequest,
    ) -> ServiceResult<GuildResponse> {
        request.validate()?;
        PermissionService::new(self.ctx)
            .require_permission(guild_id, actor_id, GuildPermissions::CHANGE_GUILD_INFO)
            .await?;

        let mut guild = self.load_guild(guild_id).await?;

        if let Some(name) = request.name {
            guild.name = name;
        }
        if let Some(description) = request.description {
            guild.description = description;
        }
        if let Some(logo_url) = request.logo_url {
            guild.logo_url = Some(logo_url);
        }
        if let Some(war_start_time) = request.war_start_time {
            guild.war_start_time = war_start_time;
        }

        self.ctx.guild_repo().update(&guild).await?;
        self.record_activity(guild_id, Some(actor_id), ActivityKind::GuildUpdate, None)
            .await?;

        info!(guild_id = %guild_id, "Guild updated");

        Ok(GuildResponse::from(&guild))
    }

    /// Update the guild's external integration settings
    #[instrument(skip(self, request))]
    pub async fn update_integration(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
        request: UpdateIntegrationRequest,
    ) -> ServiceResult<GuildResponse> {
        request.validate()?;
        PermissionService::new(self.ctx)
            .require_permission(
                guild_id,
                actor_id,
                GuildPermissions::CHANGE_GUILD_INTEGRATION,
            )
            .await?;

        let mut guild = self.load_guild(guild_id).await?;
        let integration = &mut guild.integration;

        if let Some(external_id) = request.external_id {
            integration.external_id = Some(external_id);
        }
        if let Some(webhook_url) = request.webhook_url {
            integration.webhook_url = Some(webhook_url);
        }
        if let Some(war_create) = request.notify_war_create {
            integration.notifications.war_create = war_create;
        }
        if let Some(war_cancel) = request.notify_war_cancel {
            integration.notifications.war_cancel = war_cancel;
        }
        if let Some(war_end) = request.notify_war_end {
            integration.notifications.war_end = war_end;
        }
        if let Some(reminder_minutes) = request.reminder_minutes {
            integration.reminder_minutes = reminder_minutes;
        }
        if let Some(role_map) = request.role_map {
            integration.role_map = role_map;
        }

        self.ctx
            .guild_repo()
            .update_integration(guild_id, &guild.integration)
            .await?;
        self.record_activity(
            guild_id,
            Some(actor_id),
            ActivityKind::GuildUpdateIntegration,
            None,
        )
        .await?;

        info!(guild_id = %guild_id, "Guild integration updated");

        Ok(GuildResponse::from(&guild))
    }

    /// Delete a guild and everything scoped to it
    ///
    /// Only the member holding the Guild Master role may delete the guild.
    #[instrument(skip(self))]
    pub async fn delete_guild(&self, guild_id: Snowflake, actor_id: Snowflake) -> ServiceResult<()> {
        let guild = self.load_guild(guild_id).await?;

        let member = self
            .ctx
            .member_repo()
            .find(guild_id, actor_id)
            .await?
            .ok_or(DomainError::MemberNotFound)?;
        let role = self
            .ctx
            .role_repo()
            .find_by_id(member.role_id)
            .await?
            .ok_or(DomainError::RoleNotFound(member.role_id))?;
        if !role.is_guild_master() {
            return Err(ServiceError::permission_denied(GUILD_MASTER_ROLE));
        }

        self.ctx.guild_repo().delete(guild_id).await?;

        info!(guild_id = %guild_id, name = %guild.name, "Guild deleted");

        Ok(())
    }

    /// List members of a guild
    #[instrument(skip(self))]
    pub async fn list_members(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
    ) -> ServiceResult<Vec<MemberResponse>> {
        PermissionService::new(self.ctx)
            .require_permission(guild_id, actor_id, GuildPermissions::VIEW_MEMBERS)
            .await?;

        let members = self.ctx.member_repo().find_by_guild(guild_id).await?;
        Ok(members.iter().map(MemberResponse::from).collect())
    }

    /// Recent activity log entries for a guild, newest first
    #[instrument(skip(self))]
    pub async fn list_activities(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
        limit: i64,
    ) -> ServiceResult<Vec<ActivityResponse>> {
        PermissionService::new(self.ctx)
            .require_permission(guild_id, actor_id, GuildPermissions::VIEW_ACTIVITY_LOG)
            .await?;

        let activities = self.ctx.activity_repo().find_by_guild(guild_id, limit).await?;
        Ok(activities.iter().map(ActivityResponse::from).collect())
    }

    async fn load_guild(&self, guild_id: Snowflake) -> ServiceResult<Guild> {
        self.ctx
            .guild_repo()
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Guild", guild_id.to_string()))
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
