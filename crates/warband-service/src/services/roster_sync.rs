//! Roster sync service
//!
//! Reconciles a guild's local member list against a snapshot of its external
//! roster source. The diff is computed as plain data and applied in one
//! transaction together with the refreshed member cache; the Guild Master
//! membership is never demoted or removed by sync.

use std::collections::HashMap;

use tracing::{info, instrument};

use warband_core::entities::{Guild, GuildMember, GuildRole, GUILD_MASTER_ROLE};
use warband_core::error::DomainError;
use warband_core::traits::RosterSyncPlan;
use warband_core::value_objects::Snowflake;

use crate::dto::RosterSnapshot;

use super::aggregate::AggregateService;
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Roster sync service
pub struct RosterSyncService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RosterSyncService<'a> {
    /// Create a new RosterSyncService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Sync one guild's membership from an external roster snapshot
    #[instrument(skip(self, snapshot), fields(members = snapshot.members.len()))]
    pub async fn sync_guild(
        &self,
        guild_id: Snowflake,
        snapshot: &RosterSnapshot,
    ) -> ServiceResult<RosterSyncPlan> {
        let guild = self
            .ctx
            .guild_repo()
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Guild", guild_id.to_string()))?;
        if guild.integration.external_id.is_none() {
            return Err(ServiceError::validation("Guild has no integration configured"));
        }

        let roles = self.ctx.role_repo().find_all().await?;
        let gm_role = roles
            .iter()
            .find(|r| r.name == GUILD_MASTER_ROLE)
            .ok_or_else(|| {
                ServiceError::internal(format!("{GUILD_MASTER_ROLE} role is not seeded"))
            })?;

        let local_members = self.ctx.member_repo().find_by_guild(guild_id).await?;
        if !local_members.iter().any(|m| m.role_id == gm_role.id) {
            return Err(DomainError::GuildMasterMissing.into());
        }

        // External identity of each current member
        let mut external_ids: HashMap<Snowflake, String> = HashMap::new();
        for member in &local_members {
            if let Some(profile) = self
                .ctx
                .profile_repo()
                .find_by_id(member.user_profile_id)
                .await?
            {
                if let Some(external_id) = profile.external_id {
                    external_ids.insert(member.user_profile_id, external_id);
                }
            }
        }

        // Local profiles for the snapshot's external members
        let mut profiles_by_external: HashMap<String, Snowflake> = HashMap::new();
        for external_id in snapshot.members.keys() {
            if let Some(profile) = self
                .ctx
                .profile_repo()
                .find_by_external_id(external_id)
                .await?
            {
                profiles_by_external.insert(external_id.clone(), profile.id);
            }
        }

        let plan = diff_roster(
            &guild,
            snapshot,
            &local_members,
            &roles,
            &external_ids,
            &profiles_by_external,
            gm_role.id,
        );

        self.ctx.member_repo().apply_sync(&plan).await?;

        let aggregates = AggregateService::new(self.ctx);
        for member in &plan.add {
            aggregates.ensure_member(guild_id, member.user_profile_id).await?;
            aggregates.ensure_player(member.user_profile_id).await?;
        }

        info!(
            guild_id = %guild_id,
            added = plan.add.len(),
            re_ranked = plan.update_roles.len(),
            removed = plan.remove.len(),
            cached = plan.member_cache.len(),
            "Roster synced"
        );

        Ok(plan)
    }

    /// Sync every guild with an integration configured
    #[instrument(skip(self, snapshots))]
    pub async fn sync_all(
        &self,
        snapshots: &HashMap<String, RosterSnapshot>,
    ) -> ServiceResult<usize> {
        let guilds = self.ctx.guild_repo().find_integrated().await?;
        let mut synced = 0;
        for guild in &guilds {
            let Some(external_id) = guild.integration.external_id.as_deref() else {
                continue;
            };
            let Some(snapshot) = snapshots.get(external_id) else {
                continue;
            };
            self.sync_guild(guild.id, snapshot).await?;
            synced += 1;
        }
        Ok(synced)
    }
}

/// Compute the membership diff between the external snapshot and the local
/// member list
///
/// An external member resolves to the highest-authority local role whose
/// mapped external role name they hold; members matching no mapped role are
/// ignored. Members are only removed when their profile's external identity
/// is absent from the snapshot, and the Guild Master membership is exempt
/// from both re-ranking and removal.
pub fn diff_roster(
    guild: &Guild,
    snapshot: &RosterSnapshot,
    local_members: &[GuildMember],
    roles: &[GuildRole],
    external_ids: &HashMap<Snowflake, String>,
    profiles_by_external: &HashMap<String, Snowflake>,
    gm_role_id: Snowflake,
) -> RosterSyncPlan {
    // Roles by authority, highest first, with their mapped external names
    let mut mapped_roles: Vec<(&GuildRole, &str)> = roles
        .iter()
        .filter_map(|role| {
            guild
                .integration
                .role_map
                .get(&role.id)
                .map(|name| (role, name.as_str()))
        })
        .collect();
    mapped_roles.sort_by_key(|(role, _)| role.priority);

    // Resolve each external member to a local role
    let mut member_cache: HashMap<String, Snowflake> = HashMap::new();
    for (external_id, held_role_ids) in &snapshot.members {
        let held_names: Vec<&str> = held_role_ids
            .iter()
            .filter_map(|id| snapshot.roles.get(id).map(String::as_str))
            .collect();

        let resolved = mapped_roles
            .iter()
            .find(|(_, name)| held_names.contains(name))
            .map(|(role, _)| role.id);
        if let Some(role_id) = resolved {
            member_cache.insert(external_id.clone(), role_id);
        }
    }

    let local_by_profile: HashMap<Snowflake, &GuildMember> = local_members
        .iter()
        .map(|m| (m.user_profile_id, m))
        .collect();

    let mut add = Vec::new();
    let mut update_roles = Vec::new();
    for (external_id, &role_id) in &member_cache {
        let Some(&profile_id) = profiles_by_external.get(external_id) else {
            continue;
        };
        match local_by_profile.get(&profile_id) {
            None => add.push(GuildMember::new(guild.id, profile_id, role_id)),
            Some(member) if member.role_id == role_id => {}
            Some(member) => {
                // The Guild Master keeps their rank no matter what the
                // external roster says
                if member.role_id != gm_role_id {
                    update_roles.push((profile_id, role_id));
                }
            }
        }
    }

    let mut remove = Vec::new();
    for member in local_members {
        if member.role_id == gm_role_id {
            continue;
        }
        let Some(external_id) = external_ids.get(&member.user_profile_id) else {
            continue;
        };
        if !snapshot.members.contains_key(external_id) {
            remove.push(member.user_profile_id);
        }
    }

    RosterSyncPlan {
        guild_id: guild.id,
        add,
        update_roles,
        remove,
        member_cache,
    }
}
