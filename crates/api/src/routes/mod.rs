//! HTTP route handlers.

pub mod check_ins;
pub mod events;
pub mod health;
pub mod registrations;
