//! Shared utilities and common types for the event check-in backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Participant and event field validation
//! - Lock key derivation for identity serialization

pub mod crypto;
pub mod validation;
