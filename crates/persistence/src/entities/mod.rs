//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod check_in;
pub mod event;
pub mod registration;

pub use check_in::{CheckInEntity, CheckInStatusDb};
pub use event::{EventEntity, EventStatsEntity, EventStatusDb};
pub use registration::{IdentityConflictEntity, RegistrationEntity, RegistrationStatusDb};
