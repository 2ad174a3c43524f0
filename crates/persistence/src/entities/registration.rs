//! Registration entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Registration, RegistrationStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for registration_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
pub enum RegistrationStatusDb {
    Active,
    Cancelled,
}

impl From<RegistrationStatusDb> for RegistrationStatus {
    fn from(status: RegistrationStatusDb) -> Self {
        match status {
            RegistrationStatusDb::Active => RegistrationStatus::Active,
            RegistrationStatusDb::Cancelled => RegistrationStatus::Cancelled,
        }
    }
}

impl From<RegistrationStatus> for RegistrationStatusDb {
    fn from(status: RegistrationStatus) -> Self {
        match status {
            RegistrationStatus::Active => RegistrationStatusDb::Active,
            RegistrationStatus::Cancelled => RegistrationStatusDb::Cancelled,
        }
    }
}

/// Database row mapping for the registrations table.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationEntity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub full_name: String,
    pub national_id: String,
    pub phone: String,
    pub email: String,
    pub ticket_number: String,
    pub ticket_sequence: i32,
    pub status: RegistrationStatusDb,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<RegistrationEntity> for Registration {
    fn from(entity: RegistrationEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            full_name: entity.full_name,
            national_id: entity.national_id,
            phone: entity.phone,
            email: entity.email,
            ticket_number: entity.ticket_number,
            ticket_sequence: entity.ticket_sequence,
            status: entity.status.into(),
            created_at: entity.created_at,
            cancelled_at: entity.cancelled_at,
        }
    }
}

/// Identity collisions found among active registrations.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct IdentityConflictEntity {
    pub national_id: bool,
    pub email: bool,
    pub phone: bool,
}

impl From<IdentityConflictEntity> for domain::models::IdentityConflicts {
    fn from(entity: IdentityConflictEntity) -> Self {
        Self {
            national_id: entity.national_id,
            email: entity.email,
            phone: entity.phone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_to_domain() {
        let now = Utc::now();
        let entity = RegistrationEntity {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            full_name: "Ana Putri".to_string(),
            national_id: "3174012345678901".to_string(),
            phone: "081234567890".to_string(),
            email: "ana@example.com".to_string(),
            ticket_number: "BICHF007T".to_string(),
            ticket_sequence: 7,
            status: RegistrationStatusDb::Cancelled,
            created_at: now,
            cancelled_at: Some(now),
        };

        let registration: Registration = entity.clone().into();
        assert_eq!(registration.id, entity.id);
        assert_eq!(registration.ticket_number, "BICHF007T");
        assert_eq!(registration.ticket_sequence, 7);
        assert_eq!(registration.status, RegistrationStatus::Cancelled);
        assert_eq!(registration.cancelled_at, Some(now));
    }

    #[test]
    fn test_conflicts_conversion() {
        let conflicts: domain::models::IdentityConflicts = IdentityConflictEntity {
            national_id: false,
            email: true,
            phone: true,
        }
        .into();
        assert_eq!(
            conflicts.first(),
            Some(domain::models::IdentityField::Email)
        );
    }
}
