//! Activity entity <-> model mapper

use warband_core::entities::{Activity, ActivityKind};
use warband_core::error::DomainError;
use warband_core::traits::RepoResult;
use warband_core::value_objects::Snowflake;

use crate::models::ActivityModel;

/// Convert ActivityModel to Activity entity
pub fn activity_from_model(model: ActivityModel) -> RepoResult<Activity> {
    let kind = ActivityKind::from_str_value(&model.kind)
        .ok_or_else(|| DomainError::InternalError(format!("bad activity kind: {}", model.kind)))?;

    Ok(Activity {
        id: Snowflake::new(model.id),
        guild_id: Snowflake::new(model.guild_id),
        actor_profile_id: model.actor_profile_id.map(Snowflake::new),
        kind,
        detail: model.detail,
        created_at: model.created_at,
    })
}
