//! Check-in domain model and state machine.
//!
//! A registration is `checked_in` exactly when it has an effective
//! (status `checked_in`) CheckIn row. Undo never deletes the row; it flips the
//! row to `cancelled` so the audit history survives, and a later check-in
//! creates a fresh row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_not_blank, validate_search_query};
use uuid::Uuid;
use validator::Validate;

use crate::errors::{CheckInError, LookupError};
use crate::models::registration::RegistrationStatus;

/// Actor recorded when a check-in is voided by a registration cancellation.
pub const CANCELLATION_ACTOR: &str = "system:registration_cancelled";

/// Status of a single CheckIn row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInStatus {
    CheckedIn,
    Cancelled,
}

impl std::fmt::Display for CheckInStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckInStatus::CheckedIn => write!(f, "checked_in"),
            CheckInStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Attendance state of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInState {
    NotCheckedIn,
    CheckedIn,
}

impl CheckInState {
    pub fn from_effective(effective: Option<&CheckIn>) -> Self {
        match effective {
            Some(check_in) if check_in.is_effective() => CheckInState::CheckedIn,
            _ => CheckInState::NotCheckedIn,
        }
    }

    /// `not_checked_in -> checked_in`, only for active registrations.
    pub fn check_in(
        self,
        registration: RegistrationStatus,
    ) -> Result<CheckInState, CheckInError> {
        if !registration.is_active() {
            return Err(CheckInError::RegistrationNotActive);
        }
        match self {
            CheckInState::NotCheckedIn => Ok(CheckInState::CheckedIn),
            CheckInState::CheckedIn => Err(CheckInError::AlreadyCheckedIn),
        }
    }

    /// `checked_in -> not_checked_in`.
    pub fn undo(self) -> Result<CheckInState, CheckInError> {
        match self {
            CheckInState::CheckedIn => Ok(CheckInState::NotCheckedIn),
            CheckInState::NotCheckedIn => Err(CheckInError::NothingToUndo),
        }
    }
}

/// Audit record of staff admitting a participant at the venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckIn {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
    pub checked_in_by: String,
    pub status: CheckInStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undone_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undone_by: Option<String>,
}

impl CheckIn {
    pub fn is_effective(&self) -> bool {
        self.status == CheckInStatus::CheckedIn
    }
}

/// Request payload for checking in a registration.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CheckInRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Staff ID must be between 1 and 100 characters"
    ))]
    #[validate(custom(function = "validate_not_blank"))]
    pub staff_id: String,
}

/// Request payload for undoing a check-in.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UndoCheckInRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Staff ID must be between 1 and 100 characters"
    ))]
    #[validate(custom(function = "validate_not_blank"))]
    pub staff_id: Option<String>,
}

/// Response payload for an undo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UndoCheckInResponse {
    pub registration_id: Uuid,
    pub check_in_id: Uuid,
    pub undone: bool,
}

/// Check-in at the desk by free-text lookup (name, phone, ticket, national ID fragment).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct ResolveCheckInRequest {
    #[validate(length(
        min = 2,
        max = 100,
        message = "Search query must be between 2 and 100 characters"
    ))]
    #[validate(custom(function = "validate_search_query"))]
    pub query: String,

    pub event_id: Option<Uuid>,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Staff ID must be between 1 and 100 characters"
    ))]
    #[validate(custom(function = "validate_not_blank"))]
    pub staff_id: String,
}

/// Full check-in history of a registration, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckInHistoryResponse {
    pub registration_id: Uuid,
    pub data: Vec<CheckIn>,
}

/// Reduces lookup matches to exactly one, surfacing ambiguity to the caller.
pub fn resolve_single<T>(mut matches: Vec<T>) -> Result<T, LookupError> {
    match matches.len() {
        0 => Err(LookupError::NotFound),
        1 => Ok(matches.remove(0)),
        n => Err(LookupError::Ambiguous { matches: n }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_in(status: CheckInStatus) -> CheckIn {
        CheckIn {
            id: Uuid::new_v4(),
            registration_id: Uuid::new_v4(),
            checked_in_at: Utc::now(),
            checked_in_by: "desk-1".to_string(),
            status,
            undone_at: None,
            undone_by: None,
        }
    }

    #[test]
    fn test_state_from_effective() {
        assert_eq!(CheckInState::from_effective(None), CheckInState::NotCheckedIn);
        let active = check_in(CheckInStatus::CheckedIn);
        assert_eq!(
            CheckInState::from_effective(Some(&active)),
            CheckInState::CheckedIn
        );
        let voided = check_in(CheckInStatus::Cancelled);
        assert_eq!(
            CheckInState::from_effective(Some(&voided)),
            CheckInState::NotCheckedIn
        );
    }

    #[test]
    fn test_check_in_from_not_checked_in() {
        let next = CheckInState::NotCheckedIn
            .check_in(RegistrationStatus::Active)
            .unwrap();
        assert_eq!(next, CheckInState::CheckedIn);
    }

    #[test]
    fn test_check_in_twice_is_rejected() {
        assert!(matches!(
            CheckInState::CheckedIn.check_in(RegistrationStatus::Active),
            Err(CheckInError::AlreadyCheckedIn)
        ));
    }

    #[test]
    fn test_check_in_cancelled_registration_is_rejected() {
        assert!(matches!(
            CheckInState::NotCheckedIn.check_in(RegistrationStatus::Cancelled),
            Err(CheckInError::RegistrationNotActive)
        ));
    }

    #[test]
    fn test_undo() {
        assert_eq!(
            CheckInState::CheckedIn.undo().unwrap(),
            CheckInState::NotCheckedIn
        );
        assert!(matches!(
            CheckInState::NotCheckedIn.undo(),
            Err(CheckInError::NothingToUndo)
        ));
    }

    #[test]
    fn test_undo_then_check_in_again() {
        let state = CheckInState::NotCheckedIn
            .check_in(RegistrationStatus::Active)
            .and_then(CheckInState::undo)
            .and_then(|s| s.check_in(RegistrationStatus::Active))
            .unwrap();
        assert_eq!(state, CheckInState::CheckedIn);
    }

    #[test]
    fn test_resolve_single() {
        assert_eq!(resolve_single(Vec::<u8>::new()), Err(LookupError::NotFound));
        assert_eq!(resolve_single(vec![7u8]), Ok(7));
        assert_eq!(
            resolve_single(vec![1u8, 2, 3]),
            Err(LookupError::Ambiguous { matches: 3 })
        );
    }

    #[test]
    fn test_check_in_request_validation() {
        let ok = CheckInRequest {
            staff_id: "desk-1".to_string(),
        };
        assert!(ok.validate().is_ok());
        let blank = CheckInRequest {
            staff_id: "  ".to_string(),
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_undo_request_validation() {
        assert!(UndoCheckInRequest::default().validate().is_ok());
        let named = UndoCheckInRequest {
            staff_id: Some("desk-2".to_string()),
        };
        assert!(named.validate().is_ok());
        let blank = UndoCheckInRequest {
            staff_id: Some("   ".to_string()),
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_resolve_request_rejects_whitespace_query() {
        let request = |query: &str| ResolveCheckInRequest {
            query: query.to_string(),
            event_id: None,
            staff_id: "desk-1".to_string(),
        };
        assert!(request("Ana").validate().is_ok());
        let errors = request("   ").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("query"));
        assert!(request(" a ").validate().is_err());
    }

    #[test]
    fn test_check_in_serialization_skips_empty_undo() {
        let json = serde_json::to_value(check_in(CheckInStatus::CheckedIn)).unwrap();
        assert_eq!(json["status"], "checked_in");
        assert!(json.get("undone_at").is_none());
        assert!(json.get("undone_by").is_none());
    }
}
