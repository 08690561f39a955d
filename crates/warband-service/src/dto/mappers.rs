//! Entity -> response DTO conversions

use warband_core::entities::{
    Activity, Character, Guild, GuildAggregate, GuildMember, GuildMemberAggregate, GuildRole,
    PlayerAggregate, Profile, TeamKind, War, WarAttendance, WarCallSign, WarOutcome, WarRole,
    WarStat, WarTeam,
};
use warband_core::traits::TeamSlot;
use warband_core::value_objects::Snowflake;

use super::responses::{
    ActivityResponse, AttendanceResponse, CallSignResponse, CharacterResponse,
    GuildAggregateResponse, GuildResponse, IntegrationResponse, MemberAggregateResponse,
    MemberResponse, PlayerAggregateResponse, ProfileResponse, RoleResponse, TeamResponse,
    WarResponse, WarRoleResponse, WarStatResponse,
};

fn outcome_str(outcome: WarOutcome) -> &'static str {
    match outcome {
        WarOutcome::Win => "WIN",
        WarOutcome::Loss => "LOSS",
        WarOutcome::Stalemate => "STALEMATE",
    }
}

impl From<&Guild> for GuildResponse {
    fn from(guild: &Guild) -> Self {
        Self {
            id: guild.id,
            name: guild.name.clone(),
            description: guild.description.clone(),
            logo_url: guild.logo_url.clone(),
            region: guild.region.clone(),
            war_start_time: guild.war_start_time,
            integration: IntegrationResponse {
                external_id: guild.integration.external_id.clone(),
                webhook_configured: guild.integration.webhook_url.is_some(),
                notify_war_create: guild.integration.notifications.war_create,
                notify_war_cancel: guild.integration.notifications.war_cancel,
                notify_war_end: guild.integration.notifications.war_end,
                reminder_minutes: guild.integration.reminder_minutes,
                role_map: guild.integration.role_map.clone(),
            },
        }
    }
}

impl From<&GuildRole> for RoleResponse {
    fn from(role: &GuildRole) -> Self {
        Self {
            id: role.id,
            name: role.name.clone(),
            priority: role.priority,
            permissions: role.permissions.list(),
        }
    }
}

impl From<&GuildMember> for MemberResponse {
    fn from(member: &GuildMember) -> Self {
        Self {
            guild_id: member.guild_id,
            user_profile_id: member.user_profile_id,
            role_id: member.role_id,
            joined_at: member.joined_at,
        }
    }
}

impl From<&Profile> for ProfileResponse {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            family_name: profile.family_name.clone(),
            external_id: profile.external_id.clone(),
            availability: profile.availability.to_day_map(),
            auto_sign_up: profile.auto_sign_up,
        }
    }
}

impl From<&Character> for CharacterResponse {
    fn from(character: &Character) -> Self {
        Self {
            id: character.id,
            profile_id: character.profile_id,
            name: character.name.clone(),
            class_name: character.class_name.clone(),
            level: character.level,
            is_main: character.is_main,
        }
    }
}

impl From<&War> for WarResponse {
    fn from(war: &War) -> Self {
        Self {
            id: war.id,
            guild_id: war.guild_id,
            date: war.date,
            node_name: war.node.as_ref().map(|n| n.name.clone()),
            node_tier: war.node.as_ref().map(|n| n.tier),
            outcome: war.outcome.map(outcome_str),
            note: war.note.clone(),
            pending: war.is_pending(),
        }
    }
}

impl From<&WarAttendance> for AttendanceResponse {
    fn from(attendance: &WarAttendance) -> Self {
        Self {
            id: attendance.id,
            war_id: attendance.war_id,
            user_profile_id: attendance.user_profile_id,
            character_id: attendance.character_id,
            status: attendance.status.as_i16(),
            note: attendance.note.clone(),
        }
    }
}

impl TeamResponse {
    /// Combine the team shell with its current slot assignments
    pub fn from_parts(team: &WarTeam, slots: &[TeamSlot]) -> Self {
        Self {
            id: team.id,
            war_id: team.war_id,
            name: team.name.clone(),
            kind: match team.kind {
                TeamKind::Platoon => "PLATOON",
                TeamKind::Party => "PARTY",
            },
            max_slots: team.kind.max_slots(),
            default_role_id: team.default_role_id,
            slot_setup: team.slot_setup.clone(),
            slots: slots
                .iter()
                .filter(|s| s.team_id == team.id)
                .map(|s| (s.slot, s.attendance_id))
                .collect(),
        }
    }
}

impl CallSignResponse {
    pub fn from_parts(call_sign: &WarCallSign, members: Vec<Snowflake>) -> Self {
        Self {
            id: call_sign.id,
            war_id: call_sign.war_id,
            name: call_sign.name.clone(),
            members,
        }
    }
}

impl From<&WarRole> for WarRoleResponse {
    fn from(role: &WarRole) -> Self {
        Self {
            id: role.id,
            name: role.name.clone(),
        }
    }
}

impl From<&WarStat> for WarStatResponse {
    fn from(stat: &WarStat) -> Self {
        Self {
            id: stat.id,
            attendance_id: stat.attendance_id,
            counters: stat.counters,
            total_kills: stat.total_kills(),
            kdr: stat.kdr(),
        }
    }
}

impl From<&GuildAggregate> for GuildAggregateResponse {
    fn from(aggregate: &GuildAggregate) -> Self {
        Self {
            guild_id: aggregate.guild_id,
            totals: aggregate.totals,
            total_kills: aggregate.totals.total_kills(),
            kdr: aggregate.totals.kdr(),
            wars_won: aggregate.wars_won,
            wars_lost: aggregate.wars_lost,
            wars_stalemated: aggregate.wars_stalemated,
            wars_finished: aggregate.wars_finished(),
        }
    }
}

impl From<&GuildMemberAggregate> for MemberAggregateResponse {
    fn from(aggregate: &GuildMemberAggregate) -> Self {
        Self {
            guild_id: aggregate.guild_id,
            user_profile_id: aggregate.user_profile_id,
            wars_attended: aggregate.attendance.wars_attended,
            wars_unavailable: aggregate.attendance.wars_unavailable,
            wars_missed: aggregate.attendance.wars_missed,
            wars_reneged: aggregate.attendance.wars_reneged,
            totals: aggregate.totals,
            total_kills: aggregate.total_kills,
            kdr: aggregate.kdr,
        }
    }
}

impl From<&PlayerAggregate> for PlayerAggregateResponse {
    fn from(aggregate: &PlayerAggregate) -> Self {
        Self {
            user_profile_id: aggregate.user_profile_id,
            wars_attended: aggregate.attendance.wars_attended,
            wars_unavailable: aggregate.attendance.wars_unavailable,
            wars_missed: aggregate.attendance.wars_missed,
            wars_reneged: aggregate.attendance.wars_reneged,
            totals: aggregate.totals,
            total_kills: aggregate.total_kills,
            kdr: aggregate.kdr,
        }
    }
}

impl From<&Activity> for ActivityResponse {
    fn from(activity: &Activity) -> Self {
        Self {
            id: activity.id,
            guild_id: activity.guild_id,
            actor_profile_id: activity.actor_profile_id,
            kind: activity.kind.as_str(),
            detail: activity.detail.clone(),
            created_at: activity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warband_core::entities::StatCounters;

    #[test]
    fn test_war_stat_response_derives() {
        let stat = WarStat {
            id: Snowflake::new(1),
            attendance_id: Snowflake::new(2),
            counters: StatCounters {
                member: 6,
                officer: 2,
                death: 4,
                ..StatCounters::ZERO
            },
        };
        let response = WarStatResponse::from(&stat);
        assert_eq!(response.total_kills, 8);
        assert_eq!(response.kdr, Some(2.0));

        let deathless = WarStat {
            counters: StatCounters {
                member: 3,
                ..StatCounters::ZERO
            },
            ..stat
        };
        assert_eq!(WarStatResponse::from(&deathless).kdr, None);
    }

    #[test]
    fn test_team_response_filters_foreign_slots() {
        let team = WarTeam {
            id: Snowflake::new(1),
            war_id: Snowflake::new(2),
            name: "Alpha".to_string(),
            kind: TeamKind::Party,
            slot_setup: std::collections::HashMap::new(),
            default_role_id: Snowflake::new(9),
        };
        let slots = vec![
            TeamSlot {
                team_id: Snowflake::new(1),
                slot: 2,
                attendance_id: Snowflake::new(30),
            },
            TeamSlot {
                team_id: Snowflake::new(7),
                slot: 1,
                attendance_id: Snowflake::new(31),
            },
        ];
        let response = TeamResponse::from_parts(&team, &slots);
        assert_eq!(response.slots.len(), 1);
        assert_eq!(response.slots[&2], Snowflake::new(30));
        assert_eq!(response.max_slots, 5);
    }
}
