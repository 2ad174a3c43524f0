//! Check-in desk routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::errors::LookupError;
use domain::models::check_in::{
    resolve_single, CheckInHistoryResponse, CheckInRequest, ResolveCheckInRequest,
    UndoCheckInRequest, UndoCheckInResponse,
};
use domain::models::ticket::parse_ticket_number;
use domain::models::CheckIn;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::{CheckInService, RegistrationService};

/// Check in a registration.
///
/// POST /api/v1/registrations/:registration_id/check-in
pub async fn check_in(
    State(state): State<AppState>,
    Path(registration_id): Path<Uuid>,
    Json(request): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<CheckIn>), ApiError> {
    request.validate()?;

    let check_in = CheckInService::new(&state)
        .check_in(registration_id, &request.staff_id)
        .await?;
    Ok((StatusCode::CREATED, Json(check_in)))
}

/// Undo the effective check-in of a registration.
///
/// DELETE /api/v1/registrations/:registration_id/check-in
///
/// The body is optional; when present it names the staff member undoing.
pub async fn undo_check_in(
    State(state): State<AppState>,
    Path(registration_id): Path<Uuid>,
    request: Option<Json<UndoCheckInRequest>>,
) -> Result<Json<UndoCheckInResponse>, ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    request.validate()?;

    let undone = CheckInService::new(&state)
        .undo(registration_id, request.staff_id.as_deref())
        .await?;

    Ok(Json(UndoCheckInResponse {
        registration_id,
        check_in_id: undone.id,
        undone: true,
    }))
}

/// Check in by ticket number.
///
/// POST /api/v1/tickets/:ticket_number/check-in
pub async fn check_in_by_ticket(
    State(state): State<AppState>,
    Path(ticket_number): Path<String>,
    Json(request): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<CheckIn>), ApiError> {
    let ticket = parse_ticket_number(&ticket_number)?;
    request.validate()?;

    let details = RegistrationService::new(&state)
        .details_by_ticket(&ticket.to_string())
        .await?
        .ok_or_else(|| ApiError::not_found("registration_not_found", "Registration not found"))?;

    let check_in = CheckInService::new(&state)
        .check_in(details.registration.id, &request.staff_id)
        .await?;
    Ok((StatusCode::CREATED, Json(check_in)))
}

/// A lookup must see at least two rows to tell a unique match from several.
const MIN_RESOLVE_CANDIDATES: u32 = 2;

/// Resolve a free-text query to exactly one active registration and check it in.
///
/// POST /api/v1/check-ins
///
/// Several matches are never auto-picked; the candidates are returned with a
/// 409 so the desk can choose.
pub async fn resolve_check_in(
    State(state): State<AppState>,
    Json(request): Json<ResolveCheckInRequest>,
) -> Result<(StatusCode, Json<CheckIn>), ApiError> {
    request.validate()?;

    let limit = i64::from(state.config.search.max_limit.max(MIN_RESOLVE_CANDIDATES));
    let matches = RegistrationService::new(&state)
        .search(&request.query, request.event_id, true, limit)
        .await?;

    let candidates = matches.clone();
    let details = resolve_single(matches).map_err(|err| match err {
        LookupError::NotFound => {
            ApiError::not_found("registration_not_found", "No registration matches the query")
        }
        LookupError::Ambiguous { .. } => ApiError::AmbiguousMatch { candidates },
    })?;

    let check_in = CheckInService::new(&state)
        .check_in(details.registration.id, &request.staff_id)
        .await?;
    Ok((StatusCode::CREATED, Json(check_in)))
}

/// Check-in audit history of a registration, newest first.
///
/// GET /api/v1/registrations/:registration_id/check-ins
pub async fn list_check_ins(
    State(state): State<AppState>,
    Path(registration_id): Path<Uuid>,
) -> Result<Json<CheckInHistoryResponse>, ApiError> {
    let data = CheckInService::new(&state).history(registration_id).await?;
    Ok(Json(CheckInHistoryResponse {
        registration_id,
        data,
    }))
}
