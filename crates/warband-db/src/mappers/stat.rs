//! Per-war stat entity <-> model mapper

use warband_core::entities::{StatCounters, WarStat};
use warband_core::value_objects::Snowflake;

use crate::models::WarStatModel;

impl From<WarStatModel> for WarStat {
    fn from(model: WarStatModel) -> Self {
        WarStat {
            id: Snowflake::new(model.id),
            attendance_id: Snowflake::new(model.attendance_id),
            counters: StatCounters {
                command_post: model.command_post,
                fort: model.fort,
                gate: model.gate,
                help: model.help,
                mount: model.mount,
                placed_objects: model.placed_objects,
                guild_master: model.guild_master,
                officer: model.officer,
                member: model.member,
                death: model.death,
                siege_weapons: model.siege_weapons,
            },
        }
    }
}
