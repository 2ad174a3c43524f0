//! Application services orchestrating repositories, metrics and side effects.

pub mod check_in;
pub mod registration;

pub use check_in::CheckInService;
pub use registration::RegistrationService;
