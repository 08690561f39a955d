//! Attendance service
//!
//! Handles pre-war sign-up: players record their own intent, officers can
//! correct anyone's. Reconciled statuses (late, reneged, no-show) are only
//! ever assigned by finalization.

use tracing::{info, instrument};
use validator::Validate;

use warband_core::entities::{Activity, ActivityKind, AttendanceStatus, WarAttendance};
use warband_core::error::DomainError;
use warband_core::value_objects::{GuildPermissions, Snowflake};

use crate::dto::{AttendanceResponse, SetAttendanceRequest};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::permission::PermissionService;

/// Attendance service
pub struct AttendanceService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AttendanceService<'a> {
    /// Create a new AttendanceService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Get one profile's attendance for a war
    #[instrument(skip(self))]
    pub async fn get_attendance(
        &self,
        war_id: Snowflake,
        profile_id: Snowflake,
    ) -> ServiceResult<AttendanceResponse> {
        let row = self
            .ctx
            .attendance_repo()
            .find_by_war_and_profile(war_id, profile_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Attendance", profile_id.to_string()))?;
        Ok(AttendanceResponse::from(&row))
    }

    /// Record pre-war intent for a member of the war's guild
    ///
    /// Self-service requires `change_my_attendance`; editing someone else
    /// requires `change_member_attendance`.
    #[instrument(skip(self, request))]
    pub async fn set_attendance(
        &self,
        war_id: Snowflake,
        target_profile_id: Snowflake,
        actor_id: Snowflake,
        request: SetAttendanceRequest,
    ) -> ServiceResult<AttendanceResponse> {
        request.validate()?;

        let war = self
            .ctx
            .war_repo()
            .find_by_id(war_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("War", war_id.to_string()))?;

        if !war.is_pending() {
            return Err(DomainError::WarFinishedImmutable.into());
        }

        let permission = if actor_id == target_profile_id {
            GuildPermissions::CHANGE_MY_ATTENDANCE
        } else {
            GuildPermissions::CHANGE_MEMBER_ATTENDANCE
        };
        PermissionService::new(self.ctx)
            .require_permission(war.guild_id, actor_id, permission)
            .await?;

        let mut row = self
            .ctx
            .attendance_repo()
            .find_by_war_and_profile(war_id, target_profile_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Attendance", target_profile_id.to_string()))?;

        if let Some(raw) = request.status {
            row.status = intent_status(raw)?;
        }
        if let Some(character_id) = request.character_id {
            let character = self
                .ctx
                .character_repo()
                .find_by_id(character_id)
                .await?
                .ok_or(DomainError::CharacterNotFound(character_id))?;
            if !character.belongs_to(target_profile_id) {
                return Err(DomainError::CharacterNotOwned.into());
            }
            row.character_id = Some(character_id);
        }
        if let Some(note) = request.note {
            row.note = Some(note);
        }

        self.ctx.attendance_repo().update(&row).await?;

        self.record_activity(
            war.guild_id,
            actor_id,
            Some(format!("war {war_id}, profile {target_profile_id}")),
        )
        .await?;

        info!(
            war_id = %war_id,
            profile_id = %target_profile_id,
            status = row.status.as_i16(),
            "Attendance updated"
        );

        Ok(AttendanceResponse::from(&row))
    }

    /// Add an attendance row for a member who joined after generation
    ///
    /// Members add their own row with `change_my_attendance`; adding someone
    /// else's requires `change_member_attendance`. Only pending wars accept
    /// new rows; walk-ins to an already finished war go through stat revision.
    #[instrument(skip(self))]
    pub async fn add_attendance(
        &self,
        war_id: Snowflake,
        target_profile_id: Snowflake,
        actor_id: Snowflake,
    ) -> ServiceResult<AttendanceResponse> {
        let war = self
            .ctx
            .war_repo()
            .find_by_id(war_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("War", war_id.to_string()))?;

        if !war.is_pending() {
            return Err(DomainError::WarFinishedImmutable.into());
        }

        let permission = if actor_id == target_profile_id {
            GuildPermissions::CHANGE_MY_ATTENDANCE
        } else {
            GuildPermissions::CHANGE_MEMBER_ATTENDANCE
        };
        PermissionService::new(self.ctx)
            .require_permission(war.guild_id, actor_id, permission)
            .await?;

        if self
            .ctx
            .member_repo()
            .find(war.guild_id, target_profile_id)
            .await?
            .is_none()
        {
            return Err(DomainError::InvalidAttendee(target_profile_id).into());
        }
        if self
            .ctx
            .attendance_repo()
            .find_by_war_and_profile(war_id, target_profile_id)
            .await?
            .is_some()
        {
            return Err(DomainError::AttendanceExists.into());
        }

        let row = WarAttendance::new(
            self.ctx.generate_id(),
            war_id,
            target_profile_id,
            AttendanceStatus::Undecided,
        );
        self.ctx.attendance_repo().create(&row).await?;

        Ok(AttendanceResponse::from(&row))
    }

    async fn record_activity(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
        detail: Option<String>,
    ) -> ServiceResult<()> {
        let activity = Activity::new(
            self.ctx.generate_id(),
            guild_id,
            Some(actor_id),
            ActivityKind::AttendanceUpdate,
            detail,
        );
        self.ctx.activity_repo().create(&activity).await?;
        Ok(())
    }
}

/// Parse a raw status, accepting only the self-reported intent values
fn intent_status(raw: i16) -> ServiceResult<AttendanceStatus> {
    match AttendanceStatus::from_i16(raw) {
        Some(
            status @ (AttendanceStatus::Attending
            | AttendanceStatus::NotAttending
            | AttendanceStatus::Undecided),
        ) => Ok(status),
        _ => Err(ServiceError::validation(format!(
            "Status {raw} is not a valid sign-up intent"
        ))),
    }
}
