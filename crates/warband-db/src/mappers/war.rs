//! War entity <-> model mapper

use warband_core::entities::{War, WarNode, WarOutcome};
use warband_core::error::DomainError;
use warband_core::traits::RepoResult;
use warband_core::value_objects::Snowflake;

use crate::models::WarModel;

/// Convert WarModel to War entity
pub fn war_from_model(model: WarModel) -> RepoResult<War> {
    let outcome = model
        .outcome
        .map(|v| {
            WarOutcome::from_i16(v)
                .ok_or_else(|| DomainError::InternalError(format!("bad war outcome: {v}")))
        })
        .transpose()?;

    let node = match (model.node_name, model.node_tier) {
        (Some(name), Some(tier)) => Some(WarNode { name, tier }),
        _ => None,
    };

    Ok(War {
        id: Snowflake::new(model.id),
        guild_id: Snowflake::new(model.guild_id),
        date: model.date,
        node,
        outcome,
        note: model.note,
        reminder_sent: model.reminder_sent,
    })
}
