//! Character database model

use sqlx::FromRow;

/// Database model for characters table
#[derive(Debug, Clone, FromRow)]
pub struct CharacterModel {
    pub id: i64,
    pub profile_id: i64,
    pub name: String,
    pub class_name: String,
    pub level: i32,
    pub is_main: bool,
}
