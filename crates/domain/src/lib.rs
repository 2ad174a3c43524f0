//! Domain layer for the event check-in backend.
//!
//! This crate contains:
//! - Domain models (Event, Registration, CheckIn) with closed status enums
//! - Pure admission and check-in decision logic
//! - Domain error types

pub mod errors;
pub mod models;
pub mod services;
