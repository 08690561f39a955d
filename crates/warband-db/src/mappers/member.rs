//! Guild membership entity <-> model mapper

use warband_core::entities::GuildMember;
use warband_core::value_objects::Snowflake;

use crate::models::GuildMemberModel;

impl From<GuildMemberModel> for GuildMember {
    fn from(model: GuildMemberModel) -> Self {
        GuildMember {
            guild_id: Snowflake::new(model.guild_id),
            user_profile_id: Snowflake::new(model.user_profile_id),
            role_id: Snowflake::new(model.role_id),
            joined_at: model.joined_at,
        }
    }
}
