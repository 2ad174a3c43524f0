//! Admission decision for a registration candidate.
//!
//! The persistence layer gathers the inputs inside the admission transaction,
//! while holding the event row lock, and applies this decision before
//! inserting. Checks run in control-flow order: event open, identity
//! uniqueness, then capacity.

use crate::errors::RegistrationError;
use crate::models::{Event, IdentityConflicts};

/// Decides whether a candidate may take a slot in `event`.
pub fn evaluate_admission(
    event: &Event,
    active_count: i64,
    conflicts: &IdentityConflicts,
) -> Result<(), RegistrationError> {
    if !event.accepts_registrations() {
        return Err(RegistrationError::EventNotOpen);
    }

    if let Some(field) = conflicts.first() {
        return Err(RegistrationError::DuplicateIdentity { field });
    }

    if event.is_full(active_count) {
        return Err(RegistrationError::CapacityExceeded {
            capacity: event.capacity,
        });
    }

    Ok(())
}
