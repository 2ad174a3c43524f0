//! Registration domain model and lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{
    normalize_email, normalize_phone, validate_national_id, validate_not_blank, validate_phone,
    validate_search_query,
};
use uuid::Uuid;
use validator::Validate;

use crate::errors::RegistrationError;
use crate::models::check_in::{CheckIn, CheckInState};
use crate::models::identity::IdentityKeys;

/// Lifecycle state of a registration.
///
/// `Active` is the only initial state and `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Active,
    Cancelled,
}

impl RegistrationStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, RegistrationStatus::Active)
    }

    pub fn can_transition_to(&self, next: RegistrationStatus) -> bool {
        matches!(
            (self, next),
            (RegistrationStatus::Active, RegistrationStatus::Cancelled)
        )
    }

    /// Transition for an administrative cancellation.
    pub fn cancel(self) -> Result<RegistrationStatus, RegistrationError> {
        if self.can_transition_to(RegistrationStatus::Cancelled) {
            Ok(RegistrationStatus::Cancelled)
        } else {
            Err(RegistrationError::AlreadyCancelled)
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::Active => write!(f, "active"),
            RegistrationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A participant's claim on one event slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub full_name: String,
    pub national_id: String,
    pub phone: String,
    pub email: String,
    pub ticket_number: String,
    pub ticket_sequence: i32,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Request payload for submitting a registration.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SubmitRegistrationRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Full name must be between 1 and 200 characters"
    ))]
    #[validate(custom(function = "validate_not_blank"))]
    pub full_name: String,

    #[validate(custom(function = "validate_national_id"))]
    pub national_id: String,

    #[validate(custom(function = "validate_phone"))]
    pub phone: String,

    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 254, message = "Email must be at most 254 characters"))]
    pub email: String,
}

impl SubmitRegistrationRequest {
    /// Normalizes the validated request into an admission candidate.
    pub fn into_new_registration(self, event_id: Uuid) -> NewRegistration {
        NewRegistration {
            event_id,
            full_name: self.full_name.trim().to_string(),
            national_id: self.national_id.trim().to_string(),
            phone: normalize_phone(&self.phone),
            email: normalize_email(&self.email),
        }
    }
}

/// Normalized admission candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub event_id: Uuid,
    pub full_name: String,
    pub national_id: String,
    pub phone: String,
    pub email: String,
}

impl NewRegistration {
    pub fn identity_keys(&self) -> IdentityKeys {
        IdentityKeys::new(&self.national_id, &self.email, &self.phone)
    }
}

/// Response payload for a successful admission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SubmitRegistrationResponse {
    pub registration_id: Uuid,
    pub event_id: Uuid,
    pub ticket_number: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Registration> for SubmitRegistrationResponse {
    fn from(registration: &Registration) -> Self {
        Self {
            registration_id: registration.id,
            event_id: registration.event_id,
            ticket_number: registration.ticket_number.clone(),
            created_at: registration.created_at,
        }
    }
}

/// Registration joined with its effective check-in, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationDetails {
    #[serde(flatten)]
    pub registration: Registration,
    pub check_in_state: CheckInState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in: Option<CheckIn>,
}

impl RegistrationDetails {
    pub fn new(registration: Registration, effective_check_in: Option<CheckIn>) -> Self {
        Self {
            check_in_state: CheckInState::from_effective(effective_check_in.as_ref()),
            registration,
            check_in: effective_check_in,
        }
    }
}

/// Query parameters for the check-in desk search.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SearchRegistrationsQuery {
    #[validate(length(min = 2, max = 100, message = "Search query must be between 2 and 100 characters"))]
    #[validate(custom(function = "validate_search_query"))]
    pub q: String,
    pub event_id: Option<Uuid>,
    pub limit: Option<u32>,
}

/// Response for registration search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchRegistrationsResponse {
    pub data: Vec<RegistrationDetails>,
    pub total: usize,
}
