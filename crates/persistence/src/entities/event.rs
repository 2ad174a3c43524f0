//! Event entity (database row mapping).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use domain::models::{Event, EventStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for event_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
pub enum EventStatusDb {
    Active,
    Inactive,
}

impl From<EventStatusDb> for EventStatus {
    fn from(status: EventStatusDb) -> Self {
        match status {
            EventStatusDb::Active => EventStatus::Active,
            EventStatusDb::Inactive => EventStatus::Inactive,
        }
    }
}

impl From<EventStatus> for EventStatusDb {
    fn from(status: EventStatus) -> Self {
        match status {
            EventStatus::Active => EventStatusDb::Active,
            EventStatus::Inactive => EventStatusDb::Inactive,
        }
    }
}

/// Database row mapping for the events table.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: Uuid,
    pub title: String,
    pub code: String,
    pub event_date: NaiveDate,
    pub event_time: NaiveTime,
    pub location: String,
    pub capacity: i32,
    pub status: EventStatusDb,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventEntity> for Event {
    fn from(entity: EventEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            code: entity.code,
            date: entity.event_date,
            time: entity.event_time,
            location: entity.location,
            capacity: entity.capacity,
            status: entity.status.into(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Aggregate counts for a single event.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct EventStatsEntity {
    pub registered_count: i64,
    pub checked_in_count: i64,
}

impl From<EventStatsEntity> for domain::models::EventStats {
    fn from(entity: EventStatsEntity) -> Self {
        Self {
            registered_count: entity.registered_count,
            checked_in_count: entity.checked_in_count,
        }
    }
}
