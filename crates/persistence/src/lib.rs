//! Persistence layer for the event check-in service.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the transactional admission,
//!   cancellation and check-in paths

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
