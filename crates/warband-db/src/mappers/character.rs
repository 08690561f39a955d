//! Character entity <-> model mapper

use warband_core::entities::Character;
use warband_core::value_objects::Snowflake;

use crate::models::CharacterModel;

impl From<CharacterModel> for Character {
    fn from(model: CharacterModel) -> Self {
        Character {
            id: Snowflake::new(model.id),
            profile_id: Snowflake::new(model.profile_id),
            name: model.name,
            class_name: model.class_name,
            level: model.level,
            is_main: model.is_main,
        }
    }
}
