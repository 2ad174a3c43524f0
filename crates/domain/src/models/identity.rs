//! Identity uniqueness policy and candidate keys.

use serde::{Deserialize, Serialize};
use shared::validation::{normalize_email, normalize_phone};

/// Participant attribute that must be unique among active registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityField {
    NationalId,
    Email,
    Phone,
}

impl IdentityField {
    /// All fields in the order they are checked and locked.
    pub const ALL: [IdentityField; 3] = [
        IdentityField::NationalId,
        IdentityField::Email,
        IdentityField::Phone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityField::NationalId => "national_id",
            IdentityField::Email => "email",
            IdentityField::Phone => "phone",
        }
    }

    /// Human-readable name used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            IdentityField::NationalId => "National ID",
            IdentityField::Email => "Email",
            IdentityField::Phone => "Phone number",
        }
    }

    pub fn duplicate_code(&self) -> &'static str {
        match self {
            IdentityField::NationalId => "duplicate_national_id",
            IdentityField::Email => "duplicate_email",
            IdentityField::Phone => "duplicate_phone",
        }
    }
}

impl std::fmt::Display for IdentityField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How far a uniqueness check reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityScope {
    /// At most one active registration across all events.
    Global,
    /// At most one active registration per event.
    Event,
}

/// Uniqueness scope for each identity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPolicy {
    pub national_id: IdentityScope,
    pub email: IdentityScope,
    pub phone: IdentityScope,
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        Self {
            national_id: IdentityScope::Global,
            email: IdentityScope::Event,
            phone: IdentityScope::Event,
        }
    }
}

impl IdentityPolicy {
    pub fn scope_for(&self, field: IdentityField) -> IdentityScope {
        match field {
            IdentityField::NationalId => self.national_id,
            IdentityField::Email => self.email,
            IdentityField::Phone => self.phone,
        }
    }

    /// Fields checked across every event, in lock order.
    pub fn global_fields(&self) -> impl Iterator<Item = IdentityField> + '_ {
        IdentityField::ALL
            .into_iter()
            .filter(move |field| self.scope_for(*field) == IdentityScope::Global)
    }
}

/// Normalized identity values of a registration candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityKeys {
    pub national_id: String,
    pub email: String,
    pub phone: String,
}

impl IdentityKeys {
    pub fn new(national_id: &str, email: &str, phone: &str) -> Self {
        Self {
            national_id: national_id.trim().to_string(),
            email: normalize_email(email),
            phone: normalize_phone(phone),
        }
    }

    pub fn value(&self, field: IdentityField) -> &str {
        match field {
            IdentityField::NationalId => &self.national_id,
            IdentityField::Email => &self.email,
            IdentityField::Phone => &self.phone,
        }
    }
}

/// Which identity fields already belong to an active registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityConflicts {
    pub national_id: bool,
    pub email: bool,
    pub phone: bool,
}

impl IdentityConflicts {
    pub fn mark(&mut self, field: IdentityField) {
        match field {
            IdentityField::NationalId => self.national_id = true,
            IdentityField::Email => self.email = true,
            IdentityField::Phone => self.phone = true,
        }
    }

    pub fn contains(&self, field: IdentityField) -> bool {
        match field {
            IdentityField::NationalId => self.national_id,
            IdentityField::Email => self.email,
            IdentityField::Phone => self.phone,
        }
    }

    /// The first colliding field in check order.
    pub fn first(&self) -> Option<IdentityField> {
        IdentityField::ALL
            .into_iter()
            .find(|field| self.contains(*field))
    }

    pub fn is_empty(&self) -> bool {
        self.first().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = IdentityPolicy::default();
        assert_eq!(policy.scope_for(IdentityField::NationalId), IdentityScope::Global);
        assert_eq!(policy.scope_for(IdentityField::Email), IdentityScope::Event);
        assert_eq!(policy.scope_for(IdentityField::Phone), IdentityScope::Event);
    }

    #[test]
    fn test_global_fields_in_lock_order() {
        let policy = IdentityPolicy {
            national_id: IdentityScope::Global,
            email: IdentityScope::Event,
            phone: IdentityScope::Global,
        };
        let fields: Vec<_> = policy.global_fields().collect();
        assert_eq!(fields, vec![IdentityField::NationalId, IdentityField::Phone]);
    }

    #[test]
    fn test_per_event_policy_has_no_global_fields() {
        let policy = IdentityPolicy {
            national_id: IdentityScope::Event,
            email: IdentityScope::Event,
            phone: IdentityScope::Event,
        };
        assert_eq!(policy.global_fields().count(), 0);
    }

    #[test]
    fn test_identity_keys_normalize() {
        let keys = IdentityKeys::new(" 1234567890123456 ", " A@X.com", "0812-345 678 ");
        assert_eq!(keys.value(IdentityField::NationalId), "1234567890123456");
        assert_eq!(keys.value(IdentityField::Email), "a@x.com");
        assert_eq!(keys.value(IdentityField::Phone), "0812345678");
    }

    #[test]
    fn test_conflicts_first_follows_check_order() {
        let mut conflicts = IdentityConflicts::default();
        assert!(conflicts.is_empty());
        assert_eq!(conflicts.first(), None);

        conflicts.mark(IdentityField::Phone);
        conflicts.mark(IdentityField::Email);
        assert_eq!(conflicts.first(), Some(IdentityField::Email));

        conflicts.mark(IdentityField::NationalId);
        assert_eq!(conflicts.first(), Some(IdentityField::NationalId));
    }

    #[test]
    fn test_scope_deserialization() {
        let scope: IdentityScope = serde_json::from_str("\"global\"").unwrap();
        assert_eq!(scope, IdentityScope::Global);
        let scope: IdentityScope = serde_json::from_str("\"event\"").unwrap();
        assert_eq!(scope, IdentityScope::Event);
    }
}
