use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::errors::{CheckInError, ErrorKind, EventError, RegistrationError};
use domain::models::ticket::TicketNumberError;
use domain::models::RegistrationDetails;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {message}")]
    NotFound { code: &'static str, message: String },

    #[error("Conflict: {message}")]
    Conflict {
        code: &'static str,
        message: String,
        field: Option<&'static str>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<ValidationDetail>,
    },

    #[error("Ambiguous match: {} registrations", .candidates.len())]
    AmbiguousMatch { candidates: Vec<RegistrationDetails> },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { code: &'static str, message: String },
}

impl ApiError {
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Maps a classified core error onto its HTTP rendering.
    fn from_kind(
        kind: ErrorKind,
        code: &'static str,
        message: String,
        field: Option<&'static str>,
    ) -> Self {
        match kind {
            ErrorKind::Validation => ApiError::validation(message),
            ErrorKind::NotFound => ApiError::NotFound { code, message },
            ErrorKind::CapacityExceeded
            | ErrorKind::DuplicateIdentity
            | ErrorKind::StateConflict => ApiError::Conflict {
                code,
                message,
                field,
            },
            ErrorKind::TicketGenerationConflict => ApiError::ServiceUnavailable { code, message },
            ErrorKind::Storage => ApiError::Internal(message),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    candidates: Option<Vec<RegistrationDetails>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = ErrorBody {
            error: String::new(),
            message: String::new(),
            field: None,
            details: None,
            candidates: None,
        };

        let status = match self {
            ApiError::NotFound { code, message } => {
                body.error = code.into();
                body.message = message;
                StatusCode::NOT_FOUND
            }
            ApiError::Conflict {
                code,
                message,
                field,
            } => {
                body.error = code.into();
                body.message = message;
                body.field = field.map(Into::into);
                StatusCode::CONFLICT
            }
            ApiError::Validation { message, details } => {
                body.error = "validation_error".into();
                body.message = message;
                body.details = (!details.is_empty()).then_some(details);
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::AmbiguousMatch { candidates } => {
                body.error = "ambiguous_match".into();
                body.message = format!(
                    "{} registrations match the query; pick one explicitly",
                    candidates.len()
                );
                body.candidates = Some(candidates);
                StatusCode::CONFLICT
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                body.error = "storage_error".into();
                body.message = "An internal error occurred".into();
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::ServiceUnavailable { code, message } => {
                tracing::warn!(code, "Service unavailable: {}", message);
                body.error = code.into();
                body.message = message;
                StatusCode::SERVICE_UNAVAILABLE
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        let field = match &err {
            RegistrationError::DuplicateIdentity { field } => Some(field.as_str()),
            _ => None,
        };
        ApiError::from_kind(err.kind(), err.code(), err.to_string(), field)
    }
}

impl From<CheckInError> for ApiError {
    fn from(err: CheckInError) -> Self {
        ApiError::from_kind(err.kind(), err.code(), err.to_string(), None)
    }
}

impl From<EventError> for ApiError {
    fn from(err: EventError) -> Self {
        let field = match &err {
            EventError::CodeTaken(_) => Some("code"),
            EventError::CapacityBelowRegistered { .. } => Some("capacity"),
            _ => None,
        };
        ApiError::from_kind(err.kind(), err.code(), err.to_string(), field)
    }
}

impl From<TicketNumberError> for ApiError {
    fn from(err: TicketNumberError) -> Self {
        let message = err.to_string();
        ApiError::Validation {
            details: vec![ValidationDetail {
                field: "ticket_number".into(),
                message: message.clone(),
            }],
            message,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found("not_found", "Resource not found"),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => ApiError::Conflict {
                            code: "conflict",
                            message: "Resource already exists".into(),
                            field: None,
                        },
                        "23503" => {
                            ApiError::not_found("not_found", "Referenced resource not found")
                        }
                        _ => ApiError::Internal(format!("Database error: {}", db_err)),
                    }
                } else {
                    ApiError::Internal(format!("Database error: {}", db_err))
                }
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        let message = if details.len() == 1 {
            details[0].message.clone()
        } else {
            format!("{} validation errors", details.len())
        };

        ApiError::Validation { message, details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use domain::models::IdentityField;
    use validator::Validate;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_duplicate_identity_renders_field() {
        let error: ApiError = RegistrationError::DuplicateIdentity {
            field: IdentityField::NationalId,
        }
        .into();
        let (status, body) = body_json(error).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "duplicate_national_id");
        assert_eq!(body["field"], "national_id");
    }

    #[tokio::test]
    async fn test_capacity_exceeded_is_conflict() {
        let error: ApiError = RegistrationError::CapacityExceeded { capacity: 1 }.into();
        let (status, body) = body_json(error).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "capacity_exceeded");
        assert!(body.get("field").is_none());
    }

    #[test]
    fn test_registration_error_statuses() {
        let cases = [
            (RegistrationError::EventNotFound, StatusCode::NOT_FOUND),
            (RegistrationError::NotFound, StatusCode::NOT_FOUND),
            (RegistrationError::EventNotOpen, StatusCode::CONFLICT),
            (RegistrationError::AlreadyCancelled, StatusCode::CONFLICT),
            (
                RegistrationError::TicketGenerationConflict,
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                RegistrationError::Validation("bad".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                RegistrationError::Storage(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            let response = ApiError::from(error).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[tokio::test]
    async fn test_check_in_errors() {
        let (status, body) = body_json(CheckInError::AlreadyCheckedIn.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "already_checked_in");

        let (status, body) = body_json(CheckInError::NothingToUndo.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "nothing_to_undo");

        let (status, _) = body_json(CheckInError::RegistrationNotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_event_errors() {
        let (status, body) =
            body_json(EventError::CapacityBelowRegistered { registered: 4 }.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "capacity_below_registered");
        assert_eq!(body["field"], "capacity");

        let (status, body) = body_json(EventError::CodeTaken("CHF".into()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "event_code_taken");
    }

    #[tokio::test]
    async fn test_internal_error_is_generic() {
        let (status, body) = body_json(ApiError::Internal("connection reset".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "storage_error");
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_ambiguous_match_lists_candidates() {
        let (status, body) = body_json(ApiError::AmbiguousMatch {
            candidates: Vec::new(),
        })
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "ambiguous_match");
        assert!(body["candidates"].is_array());
    }

    #[tokio::test]
    async fn test_malformed_ticket_is_validation_error() {
        let (status, body) = body_json(TicketNumberError::Malformed.into()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"][0]["field"], "ticket_number");
    }

    #[tokio::test]
    async fn test_from_validation_errors() {
        let request = domain::models::check_in::CheckInRequest {
            staff_id: "   ".to_string(),
        };
        let errors = request.validate().unwrap_err();
        let (status, body) = body_json(errors.into()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"][0]["field"], "staff_id");
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: ApiError = sqlx::Error::RowNotFound.into();
        match error {
            ApiError::NotFound { message, .. } => assert_eq!(message, "Resource not found"),
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            ApiError::not_found("event_not_found", "Event not found").to_string(),
            "Not found: Event not found"
        );
    }
}
