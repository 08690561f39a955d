//! Team service
//!
//! Handles war teams, slot assignment, call signs, and battlefield roles.
//! All groupings are scoped to a single pending war.

use tracing::{info, instrument};
use validator::Validate;

use warband_core::entities::{War, WarAttendance, WarCallSign, WarTeam};
use warband_core::error::DomainError;
use warband_core::traits::TeamSlot;
use warband_core::value_objects::{GuildPermissions, Snowflake};

use crate::dto::{
    CallSignResponse, CreateCallSignRequest, CreateTeamRequest, SetSlotRequest, TeamResponse,
    UpdateTeamRequest, WarRoleResponse,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::permission::PermissionService;

/// Team service
pub struct TeamService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> TeamService<'a> {
    /// Create a new TeamService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a team within a pending war
    #[instrument(skip(self, request))]
    pub async fn create_team(
        &self,
        war_id: Snowflake,
        actor_id: Snowflake,
        request: CreateTeamRequest,
    ) -> ServiceResult<TeamResponse> {
        request.validate()?;
        let war = self.load_pending_war(war_id).await?;
        PermissionService::new(self.ctx)
            .require_permission(war.guild_id, actor_id, GuildPermissions::MANAGE_TEAM)
            .await?;

        self.check_war_role(request.default_role_id).await?;

        let team = WarTeam {
            id: self.ctx.generate_id(),
            war_id,
            name: request.name,
            kind: request.kind,
            slot_setup: request.slot_setup,
            default_role_id: request.default_role_id,
        };
        for (&slot, &role_id) in &team.slot_setup {
            team.check_slot(slot)?;
            self.check_war_role(role_id).await?;
        }

        self.ctx.team_repo().create(&team).await?;

        info!(team_id = %team.id, war_id = %war_id, "Team created");

        Ok(TeamResponse::from_parts(&team, &[]))
    }

    /// Update a team's name, default role, or slot setup
    #[instrument(skip(self, request))]
    pub async fn update_team(
        &self,
        team_id: Snowflake,
        actor_id: Snowflake,
        request: UpdateTeamRequest,
    ) -> ServiceResult<TeamResponse> {
        request.validate()?;
        let mut team = self.load_team(team_id).await?;
        let war = self.load_pending_war(team.war_id).await?;
        PermissionService::new(self.ctx)
            .require_permission(war.guild_id, actor_id, GuildPermissions::MANAGE_TEAM)
            .await?;

        if let Some(name) = request.name {
            team.name = name;
        }
        if let Some(default_role_id) = request.default_role_id {
            self.check_war_role(default_role_id).await?;
            team.default_role_id = default_role_id;
        }
        if let Some(slot_setup) = request.slot_setup {
            for (&slot, &role_id) in &slot_setup {
                team.check_slot(slot)?;
                self.check_war_role(role_id).await?;
            }
            team.slot_setup = slot_setup;
        }

        self.ctx.team_repo().update(&team).await?;

        let slots = self.ctx.team_repo().find_slots(team_id).await?;
        Ok(TeamResponse::from_parts(&team, &slots))
    }

    /// Delete a team and its slot assignments
    #[instrument(skip(self))]
    pub async fn delete_team(&self, team_id: Snowflake, actor_id: Snowflake) -> ServiceResult<()> {
        let team = self.load_team(team_id).await?;
        let war = self.load_pending_war(team.war_id).await?;
        PermissionService::new(self.ctx)
            .require_permission(war.guild_id, actor_id, GuildPermissions::MANAGE_TEAM)
            .await?;

        self.ctx.team_repo().delete(team_id).await?;

        info!(team_id = %team_id, war_id = %team.war_id, "Team deleted");

        Ok(())
    }

    /// List teams of a war with their current slot assignments
    #[instrument(skip(self))]
    pub async fn list_teams(
        &self,
        war_id: Snowflake,
        actor_id: Snowflake,
    ) -> ServiceResult<Vec<TeamResponse>> {
        let war = self.load_war(war_id).await?;
        PermissionService::new(self.ctx)
            .require_permission(war.guild_id, actor_id, GuildPermissions::VIEW_WAR)
            .await?;

        let teams = self.ctx.team_repo().find_by_war(war_id).await?;
        let slots = self.ctx.team_repo().find_slots_by_war(war_id).await?;
        Ok(teams
            .iter()
            .map(|team| TeamResponse::from_parts(team, &slots))
            .collect())
    }

    /// Assign an attendee to a slot, or clear the slot
    ///
    /// An attendee holds at most one slot per war: assignment moves them out
    /// of any slot they already hold, then evicts the target slot's occupant.
    #[instrument(skip(self, request))]
    pub async fn set_slot(
        &self,
        team_id: Snowflake,
        actor_id: Snowflake,
        request: SetSlotRequest,
    ) -> ServiceResult<()> {
        let team = self.load_team(team_id).await?;
        let war = self.load_pending_war(team.war_id).await?;
        PermissionService::new(self.ctx)
            .require_permission(war.guild_id, actor_id, GuildPermissions::MANAGE_TEAM)
            .await?;

        team.check_slot(request.slot)?;

        let Some(attendance_id) = request.attendance_id else {
            self.ctx.team_repo().clear_slot(team_id, request.slot).await?;
            return Ok(());
        };

        let attendance = self.load_attendance(attendance_id).await?;
        if attendance.war_id != team.war_id {
            return Err(DomainError::AttendanceWrongWar.into());
        }

        // One repository call: the move out of any held slot and the target
        // eviction happen in the same transaction
        self.ctx
            .team_repo()
            .set_slot(
                team.war_id,
                TeamSlot {
                    team_id,
                    slot: request.slot,
                    attendance_id,
                },
            )
            .await?;

        info!(
            team_id = %team_id,
            slot = request.slot,
            attendance_id = %attendance_id,
            "Slot assigned"
        );

        Ok(())
    }

    /// Create a call sign within a pending war
    #[instrument(skip(self, request))]
    pub async fn create_call_sign(
        &self,
        war_id: Snowflake,
        actor_id: Snowflake,
        request: CreateCallSignRequest,
    ) -> ServiceResult<CallSignResponse> {
        request.validate()?;
        let war = self.load_pending_war(war_id).await?;
        PermissionService::new(self.ctx)
            .require_permission(war.guild_id, actor_id, GuildPermissions::MANAGE_CALL_SIGN)
            .await?;

        let call_sign = WarCallSign {
            id: self.ctx.generate_id(),
            war_id,
            name: request.name,
        };
        self.ctx.call_sign_repo().create(&call_sign).await?;

        Ok(CallSignResponse::from_parts(&call_sign, Vec::new()))
    }

    /// Delete a call sign and its memberships
    #[instrument(skip(self))]
    pub async fn delete_call_sign(
        &self,
        call_sign_id: Snowflake,
        actor_id: Snowflake,
    ) -> ServiceResult<()> {
        let call_sign = self.load_call_sign(call_sign_id).await?;
        let war = self.load_pending_war(call_sign.war_id).await?;
        PermissionService::new(self.ctx)
            .require_permission(war.guild_id, actor_id, GuildPermissions::MANAGE_CALL_SIGN)
            .await?;

        self.ctx.call_sign_repo().delete(call_sign_id).await?;
        Ok(())
    }

    /// List call signs of a war with their member attendance ids
    #[instrument(skip(self))]
    pub async fn list_call_signs(
        &self,
        war_id: Snowflake,
        actor_id: Snowflake,
    ) -> ServiceResult<Vec<CallSignResponse>> {
        let war = self.load_war(war_id).await?;
        PermissionService::new(self.ctx)
            .require_permission(war.guild_id, actor_id, GuildPermissions::VIEW_WAR)
            .await?;

        let call_signs = self.ctx.call_sign_repo().find_by_war(war_id).await?;
        let mut responses = Vec::with_capacity(call_signs.len());
        for call_sign in &call_signs {
            let members = self.ctx.call_sign_repo().find_members(call_sign.id).await?;
            responses.push(CallSignResponse::from_parts(call_sign, members));
        }
        Ok(responses)
    }

    /// Add an attendee to a call sign
    #[instrument(skip(self))]
    pub async fn assign_call_sign(
        &self,
        call_sign_id: Snowflake,
        attendance_id: Snowflake,
        actor_id: Snowflake,
    ) -> ServiceResult<()> {
        let call_sign = self.load_call_sign(call_sign_id).await?;
        let war = self.load_pending_war(call_sign.war_id).await?;
        PermissionService::new(self.ctx)
            .require_permission(war.guild_id, actor_id, GuildPermissions::MANAGE_CALL_SIGN)
            .await?;

        let attendance = self.load_attendance(attendance_id).await?;
        if attendance.war_id != call_sign.war_id {
            return Err(DomainError::AttendanceWrongWar.into());
        }

        self.ctx
            .call_sign_repo()
            .add_member(call_sign_id, attendance_id)
            .await?;
        Ok(())
    }

    /// Remove an attendee from a call sign
    #[instrument(skip(self))]
    pub async fn unassign_call_sign(
        &self,
        call_sign_id: Snowflake,
        attendance_id: Snowflake,
        actor_id: Snowflake,
    ) -> ServiceResult<()> {
        let call_sign = self.load_call_sign(call_sign_id).await?;
        let war = self.load_pending_war(call_sign.war_id).await?;
        PermissionService::new(self.ctx)
            .require_permission(war.guild_id, actor_id, GuildPermissions::MANAGE_CALL_SIGN)
            .await?;

        let members = self.ctx.call_sign_repo().find_members(call_sign_id).await?;
        if !members.contains(&attendance_id) {
            return Err(ServiceError::validation(
                "Attendee is not part of this call sign",
            ));
        }

        self.ctx
            .call_sign_repo()
            .remove_member(call_sign_id, attendance_id)
            .await?;
        Ok(())
    }

    /// List the battlefield role catalog
    #[instrument(skip(self))]
    pub async fn list_war_roles(&self) -> ServiceResult<Vec<WarRoleResponse>> {
        let roles = self.ctx.team_repo().find_roles().await?;
        Ok(roles.iter().map(WarRoleResponse::from).collect())
    }

    async fn check_war_role(&self, role_id: Snowflake) -> ServiceResult<()> {
        self.ctx
            .team_repo()
            .find_role(role_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("War role", role_id.to_string()))?;
        Ok(())
    }

    async fn load_war(&self, war_id: Snowflake) -> ServiceResult<War> {
        self.ctx
            .war_repo()
            .find_by_id(war_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("War", war_id.to_string()))
    }

    async fn load_pending_war(&self, war_id: Snowflake) -> ServiceResult<War> {
        let war = self.load_war(war_id).await?;
        if !war.is_pending() {
            return Err(DomainError::WarFinishedImmutable.into());
        }
        Ok(war)
    }

    async fn load_team(&self, team_id: Snowflake) -> ServiceResult<WarTeam> {
        self.ctx
            .team_repo()
            .find_by_id(team_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Team", team_id.to_string()))
    }

    async fn load_call_sign(&self, call_sign_id: Snowflake) -> ServiceResult<WarCallSign> {
        self.ctx
            .call_sign_repo()
            .find_by_id(call_sign_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Call sign", call_sign_id.to_string()))
    }

    async fn load_attendance(&self, attendance_id: Snowflake) -> ServiceResult<WarAttendance> {
        self.ctx
            .attendance_repo()
            .find_by_id(attendance_id)
            .await?
            .ok_or(DomainError::InvalidAttendee(attendance_id).into())
    }
}
