//! War attendance entity <-> model mapper

use warband_core::entities::{AttendanceStatus, WarAttendance};
use warband_core::error::DomainError;
use warband_core::traits::RepoResult;
use warband_core::value_objects::Snowflake;

use crate::models::AttendanceModel;

/// Convert AttendanceModel to WarAttendance entity
pub fn attendance_from_model(model: AttendanceModel) -> RepoResult<WarAttendance> {
    let status = AttendanceStatus::from_i16(model.status).ok_or_else(|| {
        DomainError::InternalError(format!("bad attendance status: {}", model.status))
    })?;

    Ok(WarAttendance {
        id: Snowflake::new(model.id),
        war_id: Snowflake::new(model.war_id),
        user_profile_id: Snowflake::new(model.user_profile_id),
        character_id: model.character_id.map(Snowflake::new),
        status,
        note: model.note,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_decodes() {
        let model = AttendanceModel {
            id: 1,
            war_id: 2,
            user_profile_id: 3,
            character_id: None,
            status: 4,
            note: None,
        };
        let attendance = attendance_from_model(model).unwrap();
        assert_eq!(attendance.status, AttendanceStatus::Late);
    }

    #[test]
    fn test_bad_status_is_internal_error() {
        let model = AttendanceModel {
            id: 1,
            war_id: 2,
            user_profile_id: 3,
            character_id: None,
            status: 42,
            note: None,
        };
        assert!(attendance_from_model(model).is_err());
    }
}
