//! War attendance database model

use sqlx::FromRow;

/// Database model for war_attendances table
#[derive(Debug, Clone, FromRow)]
pub struct AttendanceModel {
    pub id: i64,
    pub war_id: i64,
    pub user_profile_id: i64,
    pub character_id: Option<i64>,
    pub status: i16,
    pub note: Option<String>,
}
