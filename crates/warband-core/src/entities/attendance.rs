//! War attendance entity and the finalization reconciliation rule

use crate::value_objects::Snowflake;

/// Attendance status for one player in one war
///
/// The first three are self-reported intent; the last three are assigned at
/// finalization when intent is reconciled against what actually happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttendanceStatus {
    Attending,
    NotAttending,
    Undecided,
    NoShow,
    Late,
    Reneged,
}

impl AttendanceStatus {
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Attending => 0,
            Self::NotAttending => 1,
            Self::Undecided => 2,
            Self::NoShow => 3,
            Self::Late => 4,
            Self::Reneged => 5,
        }
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(Self::Attending),
            1 => Some(Self::NotAttending),
            2 => Some(Self::Undecided),
            3 => Some(Self::NoShow),
            4 => Some(Self::Late),
            5 => Some(Self::Reneged),
            _ => None,
        }
    }

    /// Statuses that count toward wars_attended
    #[inline]
    pub fn counts_as_attended(self) -> bool {
        matches!(self, Self::Attending | Self::Late)
    }
}

/// A player's participation record for one war. Unique per (war, profile).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarAttendance {
    pub id: Snowflake,
    pub war_id: Snowflake,
    pub user_profile_id: Snowflake,
    /// Main character snapshotted at generation time when auto-attending
    pub character_id: Option<Snowflake>,
    pub status: AttendanceStatus,
    pub note: Option<String>,
}

impl WarAttendance {
    pub fn new(
        id: Snowflake,
        war_id: Snowflake,
        user_profile_id: Snowflake,
        status: AttendanceStatus,
    ) -> Self {
        Self {
            id,
            war_id,
            user_profile_id,
            character_id: None,
            status,
            note: None,
        }
    }
}

/// Reconcile a pre-war intent against actual participation at finalization.
///
/// Returns the corrected status, or `None` when the recorded status already
/// agrees with what happened:
/// - signed up as attending but did not show -> reneged
/// - did not sign up (or declined) but showed -> late
/// - undecided and did not show -> no-show
pub fn reconcile_attendance(previous: AttendanceStatus, attended: bool) -> Option<AttendanceStatus> {
    let signed_up = previous == AttendanceStatus::Attending;

    if attended != signed_up {
        if attended {
            Some(AttendanceStatus::Late)
        } else {
            Some(AttendanceStatus::Reneged)
        }
    } else if previous == AttendanceStatus::Undecided {
        Some(AttendanceStatus::NoShow)
    } else {
        None
    }
}
