//! Event management routes for organizer tooling.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::event::{
    CreateEventRequest, EventResponse, ListEventsQuery, ListEventsResponse, UpdateEventRequest,
};
use domain::models::EventStats;
use persistence::repositories::EventRepository;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

async fn event_response(repo: &EventRepository, id: Uuid) -> Result<EventResponse, ApiError> {
    let event = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("event_not_found", "Event not found"))?;
    let stats = repo.stats(id).await?;
    Ok(EventResponse::new(event, stats))
}

/// Create an event.
///
/// POST /api/v1/events
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    request.validate()?;

    let repo = EventRepository::new(state.pool.clone());
    let event = repo.create(&request).await?;

    info!(
        event_id = %event.id,
        code = %event.code,
        capacity = event.capacity,
        "Event created"
    );

    Ok((
        StatusCode::CREATED,
        Json(EventResponse::new(event, EventStats::default())),
    ))
}

/// List events, optionally filtered by status.
///
/// GET /api/v1/events
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());
    let data = repo.list(query.status).await?;
    Ok(Json(ListEventsResponse { data }))
}

/// Get an event with its registration and check-in counts.
///
/// GET /api/v1/events/:event_id
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventResponse>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());
    Ok(Json(event_response(&repo, event_id).await?))
}

/// Partially update an event.
///
/// PATCH /api/v1/events/:event_id
///
/// Capacity changes are checked against the active registration count under
/// the event row lock.
pub async fn update_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Json<EventResponse>, ApiError> {
    request.validate()?;
    if request.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let repo = EventRepository::new(state.pool.clone());
    let event = repo.update(event_id, &request).await?;

    info!(
        event_id = %event.id,
        capacity = event.capacity,
        status = %event.status,
        "Event updated"
    );

    Ok(Json(event_response(&repo, event.id).await?))
}
