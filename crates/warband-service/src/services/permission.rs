//! Permission service
//!
//! Resolves a member's permission set from their guild role and gates
//! guild-scoped operations on it.

use tracing::instrument;

use warband_core::value_objects::{GuildPermissions, Snowflake};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Permission service
pub struct PermissionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PermissionService<'a> {
    /// Create a new PermissionService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Resolve the permission set a profile holds in a guild
    #[instrument(skip(self))]
    pub async fn get_member_permissions(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
    ) -> ServiceResult<GuildPermissions> {
        let member = self
            .ctx
            .member_repo()
            .find(guild_id, profile_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Member", profile_id.to_string()))?;

        let role = self
            .ctx
            .role_repo()
            .find_by_id(member.role_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Role", member.role_id.to_string()))?;

        Ok(role.permissions)
    }

    /// Check whether a profile holds a permission in a guild
    #[instrument(skip(self))]
    pub async fn check_permission(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
        permission: GuildPermissions,
    ) -> ServiceResult<bool> {
        let permissions = self.get_member_permissions(guild_id, profile_id).await?;
        Ok(permissions.has(permission))
    }

    /// Require a permission, failing with PermissionDenied when missing
    #[instrument(skip(self))]
    pub async fn require_permission(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
        permission: GuildPermissions,
    ) -> ServiceResult<()> {
        if !self.check_permission(guild_id, profile_id, permission).await? {
            return Err(ServiceError::permission_denied(
                permission.list().join(", "),
            ));
        }
        Ok(())
    }

    /// Check a permission by its string codename (for generic adapters)
    #[instrument(skip(self))]
    pub async fn has_permission(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
        codename: &str,
    ) -> ServiceResult<bool> {
        let permission = GuildPermissions::from_codename(codename)
            .ok_or_else(|| ServiceError::validation(format!("Unknown permission: {codename}")))?;
        self.check_permission(guild_id, profile_id, permission).await
    }
}
