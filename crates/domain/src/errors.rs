//! Error types for admission, lifecycle and check-in operations.
//!
//! Every error carries an [`ErrorKind`] and a stable machine-readable code so
//! the HTTP boundary can render field-specific messages.

use thiserror::Error;

use crate::models::identity::IdentityField;

/// Coarse classification shared by all core errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input; the caller fixes the fields and resubmits.
    Validation,
    /// The referenced event, registration or ticket does not exist.
    NotFound,
    /// The event has no free slot left.
    CapacityExceeded,
    /// National ID, email or phone already belongs to an active registration.
    DuplicateIdentity,
    /// Ticket number collided on every attempt.
    TicketGenerationConflict,
    /// The requested transition is not valid from the current state.
    StateConflict,
    /// Unexpected store failure; the operation was rolled back.
    Storage,
}

/// Errors from the registration admission and lifecycle paths.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Event not found")]
    EventNotFound,

    #[error("Event is not open for registration")]
    EventNotOpen,

    #[error("Event is full (capacity {capacity})")]
    CapacityExceeded { capacity: i32 },

    #[error("{} is already registered", .field.label())]
    DuplicateIdentity { field: IdentityField },

    #[error("Could not allocate a unique ticket number")]
    TicketGenerationConflict,

    #[error("Registration not found")]
    NotFound,

    #[error("Registration is already cancelled")]
    AlreadyCancelled,

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl RegistrationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistrationError::Validation(_) => ErrorKind::Validation,
            RegistrationError::EventNotFound | RegistrationError::NotFound => ErrorKind::NotFound,
            RegistrationError::EventNotOpen | RegistrationError::AlreadyCancelled => {
                ErrorKind::StateConflict
            }
            RegistrationError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            RegistrationError::DuplicateIdentity { .. } => ErrorKind::DuplicateIdentity,
            RegistrationError::TicketGenerationConflict => ErrorKind::TicketGenerationConflict,
            RegistrationError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Stable error code rendered to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            RegistrationError::Validation(_) => "validation_error",
            RegistrationError::EventNotFound => "event_not_found",
            RegistrationError::EventNotOpen => "event_not_open",
            RegistrationError::CapacityExceeded { .. } => "capacity_exceeded",
            RegistrationError::DuplicateIdentity { field } => field.duplicate_code(),
            RegistrationError::TicketGenerationConflict => "ticket_generation_conflict",
            RegistrationError::NotFound => "registration_not_found",
            RegistrationError::AlreadyCancelled => "registration_already_cancelled",
            RegistrationError::Storage(_) => "storage_error",
        }
    }

    /// Whether the admission should be attempted again with a fresh sequence read.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistrationError::TicketGenerationConflict)
    }
}

impl From<IdentityField> for RegistrationError {
    fn from(field: IdentityField) -> Self {
        RegistrationError::DuplicateIdentity { field }
    }
}

/// Errors from the check-in state machine.
#[derive(Debug, Error)]
pub enum CheckInError {
    #[error("Registration not found")]
    RegistrationNotFound,

    #[error("Registration is already checked in")]
    AlreadyCheckedIn,

    #[error("Registration is not active")]
    RegistrationNotActive,

    #[error("Registration has no check-in to undo")]
    NothingToUndo,

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl CheckInError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckInError::RegistrationNotFound => ErrorKind::NotFound,
            CheckInError::AlreadyCheckedIn
            | CheckInError::RegistrationNotActive
            | CheckInError::NothingToUndo => ErrorKind::StateConflict,
            CheckInError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CheckInError::RegistrationNotFound => "registration_not_found",
            CheckInError::AlreadyCheckedIn => "already_checked_in",
            CheckInError::RegistrationNotActive => "registration_not_active",
            CheckInError::NothingToUndo => "nothing_to_undo",
            CheckInError::Storage(_) => "storage_error",
        }
    }
}

/// Errors from organizer-side event management.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event not found")]
    NotFound,

    #[error("Event code {0} is already in use")]
    CodeTaken(String),

    #[error("Capacity cannot be lower than the {registered} active registrations")]
    CapacityBelowRegistered { registered: i64 },

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl EventError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EventError::NotFound => ErrorKind::NotFound,
            EventError::CodeTaken(_) | EventError::CapacityBelowRegistered { .. } => {
                ErrorKind::StateConflict
            }
            EventError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            EventError::NotFound => "event_not_found",
            EventError::CodeTaken(_) => "event_code_taken",
            EventError::CapacityBelowRegistered { .. } => "capacity_below_registered",
            EventError::Storage(_) => "storage_error",
        }
    }
}

/// Outcome of resolving a free-text lookup to a single registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("No registration matches the query")]
    NotFound,

    #[error("{matches} registrations match the query")]
    Ambiguous { matches: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_error_kinds() {
        assert_eq!(
            RegistrationError::CapacityExceeded { capacity: 1 }.kind(),
            ErrorKind::CapacityExceeded
        );
        assert_eq!(
            RegistrationError::DuplicateIdentity {
                field: IdentityField::Email
            }
            .kind(),
            ErrorKind::DuplicateIdentity
        );
        assert_eq!(
            RegistrationError::AlreadyCancelled.kind(),
            ErrorKind::StateConflict
        );
        assert_eq!(
            RegistrationError::Storage(sqlx::Error::PoolTimedOut).kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn test_duplicate_identity_codes_are_field_specific() {
        let codes: Vec<_> = IdentityField::ALL
            .iter()
            .map(|field| RegistrationError::DuplicateIdentity { field: *field }.code())
            .collect();
        assert_eq!(
            codes,
            vec![
                "duplicate_national_id",
                "duplicate_email",
                "duplicate_phone"
            ]
        );
    }

    #[test]
    fn test_duplicate_identity_display() {
        let err = RegistrationError::DuplicateIdentity {
            field: IdentityField::NationalId,
        };
        assert_eq!(err.to_string(), "National ID is already registered");
    }

    #[test]
    fn test_only_ticket_conflict_is_retryable() {
        assert!(RegistrationError::TicketGenerationConflict.is_retryable());
        assert!(!RegistrationError::CapacityExceeded { capacity: 5 }.is_retryable());
        assert!(!RegistrationError::EventNotOpen.is_retryable());
    }

    #[test]
    fn test_check_in_error_codes() {
        assert_eq!(CheckInError::AlreadyCheckedIn.code(), "already_checked_in");
        assert_eq!(CheckInError::NothingToUndo.code(), "nothing_to_undo");
        assert_eq!(
            CheckInError::RegistrationNotActive.kind(),
            ErrorKind::StateConflict
        );
        assert_eq!(
            CheckInError::RegistrationNotFound.kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_event_error_display() {
        let err = EventError::CapacityBelowRegistered { registered: 12 };
        assert_eq!(
            err.to_string(),
            "Capacity cannot be lower than the 12 active registrations"
        );
        assert_eq!(err.code(), "capacity_below_registered");
    }

    #[test]
    fn test_lookup_error_display() {
        assert_eq!(
            LookupError::Ambiguous { matches: 3 }.to_string(),
            "3 registrations match the query"
        );
    }
}
