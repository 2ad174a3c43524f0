//! Event repository for database operations.

use domain::errors::EventError;
use domain::models::event::{CreateEventRequest, UpdateEventRequest};
use domain::models::{Event, EventStats, EventStatus};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::db::unique_violation_constraint;
use crate::entities::{EventEntity, EventStatsEntity, EventStatusDb};
use crate::metrics::{LockKind, LockTimer, QueryTimer};

const EVENT_COLUMNS: &str = "id, title, code, event_date, event_time, location, capacity, status, created_at, updated_at";

/// Locks the event row for the rest of the transaction.
///
/// Every admission and capacity change for an event goes through this lock,
/// so the active-count read that follows is stable until commit.
pub(crate) async fn lock_event(
    conn: &mut PgConnection,
    event_id: Uuid,
) -> Result<Option<EventEntity>, sqlx::Error> {
    let wait = LockTimer::start(LockKind::EventRow);
    let row = sqlx::query_as::<_, EventEntity>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
    ))
    .bind(event_id)
    .fetch_optional(conn)
    .await?;
    wait.acquired();
    Ok(row)
}

/// Counts active registrations for an event.
pub(crate) async fn count_active_registrations(
    conn: &mut PgConnection,
    event_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND status = 'active'",
    )
    .bind(event_id)
    .fetch_one(conn)
    .await
}

/// Repository for event-related database operations.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event. Fails with `CodeTaken` if the code is in use.
    pub async fn create(&self, request: &CreateEventRequest) -> Result<Event, EventError> {
        let timer = QueryTimer::new("create_event");
        let status: EventStatusDb = request.status.unwrap_or(EventStatus::Active).into();

        let result = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            INSERT INTO events (title, code, event_date, event_time, location, capacity, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(request.title.trim())
        .bind(&request.code)
        .bind(request.date)
        .bind(request.time)
        .bind(request.location.trim())
        .bind(request.capacity)
        .bind(status)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        match result {
            Ok(entity) => Ok(entity.into()),
            Err(e) if unique_violation_constraint(&e) == Some("events_code_key") => {
                Err(EventError::CodeTaken(request.code.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Find an event by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_id");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|entity| entity.map(Into::into))
    }

    /// List events ordered by date, optionally filtered by status.
    pub async fn list(&self, status: Option<EventStatus>) -> Result<Vec<Event>, sqlx::Error> {
        let timer = QueryTimer::new("list_events");
        let status: Option<EventStatusDb> = status.map(Into::into);
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM events
            WHERE ($1::event_status IS NULL OR status = $1)
            ORDER BY event_date, event_time, code
            "#
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result.map(|rows| rows.into_iter().map(Into::into).collect())
    }

    /// Active registration and effective check-in counts for an event.
    pub async fn stats(&self, event_id: Uuid) -> Result<EventStats, sqlx::Error> {
        let timer = QueryTimer::new("event_stats");
        let result = sqlx::query_as::<_, EventStatsEntity>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM registrations
                 WHERE event_id = $1 AND status = 'active') AS registered_count,
                (SELECT COUNT(*) FROM check_ins c
                 JOIN registrations r ON r.id = c.registration_id
                 WHERE r.event_id = $1 AND c.status = 'checked_in') AS checked_in_count
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(Into::into)
    }

    /// Apply a partial update under the event row lock.
    ///
    /// Capacity may not drop below the current number of active registrations.
    pub async fn update(
        &self,
        id: Uuid,
        request: &UpdateEventRequest,
    ) -> Result<Event, EventError> {
        let timer = QueryTimer::new("update_event");
        let mut tx = self.pool.begin().await?;

        let current: Event = lock_event(&mut *tx, id)
            .await?
            .ok_or(EventError::NotFound)?
            .into();

        if let Some(capacity) = request.capacity {
            let registered = count_active_registrations(&mut *tx, id).await?;
            if i64::from(capacity) < registered {
                return Err(EventError::CapacityBelowRegistered { registered });
            }
        }

        let updated = request.apply(&current);
        let status: EventStatusDb = updated.status.into();
        let entity = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            UPDATE events
            SET title = $2, event_date = $3, event_time = $4, location = $5,
                capacity = $6, status = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&updated.title)
        .bind(updated.date)
        .bind(updated.time)
        .bind(&updated.location)
        .bind(updated.capacity)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(entity.into())
    }
}
