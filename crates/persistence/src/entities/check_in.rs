//! Check-in entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{CheckIn, CheckInStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for check_in_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "check_in_status", rename_all = "snake_case")]
pub enum CheckInStatusDb {
    CheckedIn,
    Cancelled,
}

impl From<CheckInStatusDb> for CheckInStatus {
    fn from(status: CheckInStatusDb) -> Self {
        match status {
            CheckInStatusDb::CheckedIn => CheckInStatus::CheckedIn,
            CheckInStatusDb::Cancelled => CheckInStatus::Cancelled,
        }
    }
}

/// Database row mapping for the check_ins table.
#[derive(Debug, Clone, FromRow)]
pub struct CheckInEntity {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
    pub checked_in_by: String,
    pub status: CheckInStatusDb,
    pub undone_at: Option<DateTime<Utc>>,
    pub undone_by: Option<String>,
}

impl From<CheckInEntity> for CheckIn {
    fn from(entity: CheckInEntity) -> Self {
        Self {
            id: entity.id,
            registration_id: entity.registration_id,
            checked_in_at: entity.checked_in_at,
            checked_in_by: entity.checked_in_by,
            status: entity.status.into(),
            undone_at: entity.undone_at,
            undone_by: entity.undone_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_entity_to_domain() {
        let entity = CheckInEntity {
            id: Uuid::new_v4(),
            registration_id: Uuid::new_v4(),
            checked_in_at: Utc::now(),
            checked_in_by: "staff-7".to_string(),
            status: CheckInStatusDb::CheckedIn,
            undone_at: None,
            undone_by: None,
        };

        let check_in: CheckIn = entity.into();
        assert!(check_in.is_effective());
        assert_eq!(check_in.checked_in_by, "staff-7");
    }

    #[test]
    fn test_undone_entity_to_domain() {
        let entity = CheckInEntity {
            id: Uuid::new_v4(),
            registration_id: Uuid::new_v4(),
            checked_in_at: Utc::now(),
            checked_in_by: "staff-7".to_string(),
            status: CheckInStatusDb::Cancelled,
            undone_at: Some(Utc::now()),
            undone_by: Some("staff-9".to_string()),
        };

        let check_in: CheckIn = entity.into();
        assert!(!check_in.is_effective());
        assert_eq!(check_in.status, CheckInStatus::Cancelled);
        assert_eq!(check_in.undone_by.as_deref(), Some("staff-9"));
    }
}
