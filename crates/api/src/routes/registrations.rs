//! Registration routes: public submission, lookup, search and cancellation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use domain::models::registration::{
    SearchRegistrationsQuery, SearchRegistrationsResponse, SubmitRegistrationRequest,
    SubmitRegistrationResponse,
};
use domain::models::ticket::parse_ticket_number;
use domain::models::{Registration, RegistrationDetails};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::RequestId;
use crate::services::RegistrationService;

fn registration_not_found() -> ApiError {
    ApiError::not_found("registration_not_found", "Registration not found")
}

/// Submit a registration for an event.
///
/// POST /api/v1/events/:event_id/registrations
///
/// Public route, rate limited per client IP.
pub async fn submit_registration(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    request_id: Option<Extension<RequestId>>,
    Json(request): Json<SubmitRegistrationRequest>,
) -> Result<(StatusCode, Json<SubmitRegistrationResponse>), ApiError> {
    request.validate()?;

    let service = RegistrationService::new(&state);
    let registration = service
        .submit(request.into_new_registration(event_id))
        .await?;

    info!(
        event_id = %event_id,
        registration_id = %registration.id,
        request_id = request_id.as_ref().map(|Extension(id)| id.0.as_str()).unwrap_or("-"),
        "Registration submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitRegistrationResponse::from(&registration)),
    ))
}

/// Get a registration with its check-in state.
///
/// GET /api/v1/registrations/:registration_id
pub async fn get_registration(
    State(state): State<AppState>,
    Path(registration_id): Path<Uuid>,
) -> Result<Json<RegistrationDetails>, ApiError> {
    let service = RegistrationService::new(&state);
    let details = service
        .details(registration_id)
        .await?
        .ok_or_else(registration_not_found)?;
    Ok(Json(details))
}

/// Search registrations by ticket number, name, phone, national ID or email.
///
/// GET /api/v1/registrations?q=&event_id=&limit=
pub async fn search_registrations(
    State(state): State<AppState>,
    Query(query): Query<SearchRegistrationsQuery>,
) -> Result<Json<SearchRegistrationsResponse>, ApiError> {
    query.validate()?;

    let limit = state.config.search.effective_limit(query.limit);
    let service = RegistrationService::new(&state);
    let data = service.search(&query.q, query.event_id, false, limit).await?;

    Ok(Json(SearchRegistrationsResponse {
        total: data.len(),
        data,
    }))
}

/// Look up a registration by ticket number.
///
/// GET /api/v1/tickets/:ticket_number
pub async fn get_by_ticket(
    State(state): State<AppState>,
    Path(ticket_number): Path<String>,
) -> Result<Json<RegistrationDetails>, ApiError> {
    let ticket = parse_ticket_number(&ticket_number)?;

    let service = RegistrationService::new(&state);
    let details = service
        .details_by_ticket(&ticket.to_string())
        .await?
        .ok_or_else(registration_not_found)?;
    Ok(Json(details))
}

/// Cancel a registration. Frees its slot and voids its check-in.
///
/// POST /api/v1/registrations/:registration_id/cancel
pub async fn cancel_registration(
    State(state): State<AppState>,
    Path(registration_id): Path<Uuid>,
) -> Result<Json<Registration>, ApiError> {
    let service = RegistrationService::new(&state);
    let registration = service.cancel(registration_id).await?;
    Ok(Json(registration))
}
