//! Aggregate entity <-> model mappers

use warband_core::entities::{
    AttendanceCounts, GuildAggregate, GuildMemberAggregate, PlayerAggregate, StatCounters,
};
use warband_core::value_objects::Snowflake;

use crate::models::{GuildAggregateModel, MemberAggregateModel, PlayerAggregateModel};

impl From<GuildAggregateModel> for GuildAggregate {
    fn from(model: GuildAggregateModel) -> Self {
        GuildAggregate {
            id: Snowflake::new(model.id),
            guild_id: Snowflake::new(model.guild_id),
            totals: StatCounters {
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
            wars_won: model.wars_won,
            wars_lost: model.wars_lost,
            wars_stalemated: model.wars_stalemated,
        }
    }
}

impl From<MemberAggregateModel> for GuildMemberAggregate {
    fn from(model: MemberAggregateModel) -> Self {
        GuildMemberAggregate {
            id: Snowflake::new(model.id),
            guild_id: Snowflake::new(model.guild_id),
            user_profile_id: Snowflake::new(model.user_profile_id),
            war_id: Snowflake::new(model.war_id),
            attendance: AttendanceCounts {
                wars_attended: model.wars_attended,
                wars_unavailable: model.wars_unavailable,
                wars_missed: model.wars_missed,
                wars_reneged: model.wars_reneged,
            },
            totals: StatCounters {
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
            total_kills: model.total_kills,
            kdr: model.kdr,
        }
    }
}

impl From<PlayerAggregateModel> for PlayerAggregate {
    fn from(model: PlayerAggregateModel) -> Self {
        PlayerAggregate {
            id: Snowflake::new(model.id),
            user_profile_id: Snowflake::new(model.user_profile_id),
            war_id: Snowflake::new(model.war_id),
            attendance: AttendanceCounts {
                wars_attended: model.wars_attended,
                wars_unavailable: model.wars_unavailable,
                wars_missed: model.wars_missed,
                wars_reneged: model.wars_reneged,
            },
            totals: StatCounters {
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
            total_kills: model.total_kills,
            kdr: model.kdr,
        }
    }
}
