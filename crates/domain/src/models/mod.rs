//! Domain models for event registration and check-in.

pub mod check_in;
pub mod event;
pub mod identity;
pub mod registration;
pub mod ticket;

pub use check_in::{CheckIn, CheckInState, CheckInStatus};
pub use event::{Event, EventStats, EventStatus};
pub use identity::{IdentityConflicts, IdentityField, IdentityKeys, IdentityPolicy, IdentityScope};
pub use registration::{NewRegistration, Registration, RegistrationDetails, RegistrationStatus};
pub use ticket::TicketNumber;
