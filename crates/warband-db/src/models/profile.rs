//! Profile database model

use sqlx::FromRow;

/// Database model for profiles table
#[derive(Debug, Clone, FromRow)]
pub struct ProfileModel {
    pub id: i64,
    pub family_name: String,
    pub external_id: Option<String>,
    /// Day-name -> status document, sanitized at the mapper boundary
    pub availability: serde_json::Value,
    pub auto_sign_up: bool,
}
