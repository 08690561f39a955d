//! War call sign database model

use sqlx::FromRow;

/// Database model for war_call_signs table
#[derive(Debug, Clone, FromRow)]
pub struct CallSignModel {
    pub id: i64,
    pub war_id: i64,
    pub name: String,
}
