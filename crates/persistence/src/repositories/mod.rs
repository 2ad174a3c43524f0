//! Repository implementations for database operations.

pub mod check_in;
pub mod event;
pub mod registration;

pub use check_in::CheckInRepository;
pub use event::EventRepository;
pub use registration::{AdmittedRegistration, CancelledRegistration, RegistrationRepository};
