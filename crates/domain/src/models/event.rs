//! Event domain model.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_event_code, validate_not_blank};
use uuid::Uuid;
use validator::Validate;

/// Maximum capacity accepted for a single event.
pub const MAX_EVENT_CAPACITY: i32 = 100_000;

/// Whether an event accepts new registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Active,
    Inactive,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Active => write!(f, "active"),
            EventStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// A scheduled activity with a capacity limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub code: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub capacity: i32,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn accepts_registrations(&self) -> bool {
        self.status == EventStatus::Active
    }

    /// Free slots given the current active-registration count.
    pub fn remaining_capacity(&self, active_count: i64) -> i64 {
        (i64::from(self.capacity) - active_count).max(0)
    }

    pub fn is_full(&self, active_count: i64) -> bool {
        active_count >= i64::from(self.capacity)
    }
}

/// Live counters attached to an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EventStats {
    pub registered_count: i64,
    pub checked_in_count: i64,
}

/// Event with its live counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EventResponse {
    #[serde(flatten)]
    pub event: Event,
    pub registered_count: i64,
    pub checked_in_count: i64,
    pub remaining_capacity: i64,
}

impl EventResponse {
    pub fn new(event: Event, stats: EventStats) -> Self {
        let remaining_capacity = event.remaining_capacity(stats.registered_count);
        Self {
            event,
            registered_count: stats.registered_count,
            checked_in_count: stats.checked_in_count,
            remaining_capacity,
        }
    }
}

/// Request to create a new event.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub title: String,

    #[validate(custom(function = "validate_event_code"))]
    pub code: String,

    pub date: NaiveDate,

    pub time: NaiveTime,

    #[validate(length(
        min = 1,
        max = 200,
        message = "Location must be between 1 and 200 characters"
    ))]
    #[validate(custom(function = "validate_not_blank"))]
    pub location: String,

    #[validate(range(min = 1, max = 100000, message = "Capacity must be between 1 and 100000"))]
    pub capacity: i32,

    #[serde(default)]
    pub status: Option<EventStatus>,
}

/// Partial update of an event. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub title: Option<String>,

    pub date: Option<NaiveDate>,

    pub time: Option<NaiveTime>,

    #[validate(length(
        min = 1,
        max = 200,
        message = "Location must be between 1 and 200 characters"
    ))]
    #[validate(custom(function = "validate_not_blank"))]
    pub location: Option<String>,

    #[validate(range(min = 1, max = 100000, message = "Capacity must be between 1 and 100000"))]
    pub capacity: Option<i32>,

    pub status: Option<EventStatus>,
}

impl UpdateEventRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.location.is_none()
            && self.capacity.is_none()
            && self.status.is_none()
    }

    /// Applies the update to a copy of `event`.
    pub fn apply(&self, event: &Event) -> Event {
        let mut updated = event.clone();
        if let Some(title) = &self.title {
            updated.title = title.trim().to_string();
        }
        if let Some(date) = self.date {
            updated.date = date;
        }
        if let Some(time) = self.time {
            updated.time = time;
        }
        if let Some(location) = &self.location {
            updated.location = location.trim().to_string();
        }
        if let Some(capacity) = self.capacity {
            updated.capacity = capacity;
        }
        if let Some(status) = self.status {
            updated.status = status;
        }
        updated
    }
}

/// Query parameters for listing events.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListEventsQuery {
    pub status: Option<EventStatus>,
}

/// Response for listing events.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListEventsResponse {
    pub data: Vec<Event>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::event;
    use super::*;

    fn create_request() -> CreateEventRequest {
        CreateEventRequest {
            title: "Community Health Fair".to_string(),
            code: "CHF".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 11, 14).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            location: "Town Hall".to_string(),
            capacity: 100,
            status: None,
        }
    }

    #[test]
    fn test_remaining_capacity() {
        let e = event(10, EventStatus::Active);
        assert_eq!(e.remaining_capacity(0), 10);
        assert_eq!(e.remaining_capacity(7), 3);
        assert_eq!(e.remaining_capacity(10), 0);
        assert_eq!(e.remaining_capacity(12), 0);
    }

    #[test]
    fn test_is_full() {
        let e = event(2, EventStatus::Active);
        assert!(!e.is_full(1));
        assert!(e.is_full(2));
    }

    #[test]
    fn test_accepts_registrations() {
        assert!(event(1, EventStatus::Active).accepts_registrations());
        assert!(!event(1, EventStatus::Inactive).accepts_registrations());
    }

    #[test]
    fn test_event_response_flattens_event() {
        let e = event(5, EventStatus::Active);
        let response = EventResponse::new(
            e,
            EventStats {
                registered_count: 3,
                checked_in_count: 1,
            },
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["code"], "CHF");
        assert_eq!(json["status"], "active");
        assert_eq!(json["registered_count"], 3);
        assert_eq!(json["remaining_capacity"], 2);
    }

    #[test]
    fn test_create_event_request_valid() {
        assert!(create_request().validate().is_ok());
    }

    #[test]
    fn test_create_event_request_rejects_zero_capacity() {
        let mut request = create_request();
        request.capacity = 0;
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("capacity"));
    }

    #[test]
    fn test_create_event_request_rejects_bad_code() {
        let mut request = create_request();
        request.code = "chf1".to_string();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("code"));
    }

    #[test]
    fn test_create_event_request_rejects_blank_title() {
        let mut request = create_request();
        request.title = "   ".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_event_request_apply() {
        let e = event(10, EventStatus::Active);
        let update = UpdateEventRequest {
            capacity: Some(20),
            status: Some(EventStatus::Inactive),
            title: Some("  Renamed ".to_string()),
            ..Default::default()
        };
        let updated = update.apply(&e);
        assert_eq!(updated.capacity, 20);
        assert_eq!(updated.status, EventStatus::Inactive);
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.code, e.code);
        assert_eq!(updated.location, e.location);
    }

    #[test]
    fn test_update_event_request_is_empty() {
        assert!(UpdateEventRequest::default().is_empty());
        let update = UpdateEventRequest {
            capacity: Some(3),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_update_event_request_rejects_zero_capacity() {
        let update = UpdateEventRequest {
            capacity: Some(0),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_update_event_request_rejects_blank_text() {
        let title = UpdateEventRequest {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(title.validate().unwrap_err().field_errors().contains_key("title"));
        let location = UpdateEventRequest {
            location: Some(" \t ".to_string()),
            ..Default::default()
        };
        assert!(location.validate().unwrap_err().field_errors().contains_key("location"));
        let renamed = UpdateEventRequest {
            title: Some("Renamed".to_string()),
            location: Some("Hall B".to_string()),
            ..Default::default()
        };
        assert!(renamed.validate().is_ok());
    }
}
