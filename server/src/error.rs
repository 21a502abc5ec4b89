//! Typed failures surfaced at the request boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::api::ErrorResponse;

/// Every failure a handler can produce. Validation problems are raised
/// before any mutation is attempted; `Conflict` is the storage layer
/// rejecting a uniqueness race that the application-level precondition
/// checks did not see.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Cannot subscribe to yourself")]
    SelfFollow,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Internal server error")]
    Internal,
}

impl From<DieselError> for ApiError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => ApiError::NotFound("Not found".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                ApiError::Conflict(info.message().to_string())
            }
            other => {
                tracing::error!("Database error: {}", other);
                ApiError::Internal
            }
        }
    }
}

impl From<potluck_core::short_link::ShortLinkError> for ApiError {
    fn from(err: potluck_core::short_link::ShortLinkError) -> Self {
        tracing::error!("Short link generation failed: {}", err);
        ApiError::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Validation(_) | ApiError::Duplicate(_) | ApiError::SelfFollow => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Duplicate("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::SelfFollow, StatusCode::BAD_REQUEST),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_diesel_not_found_maps_to_not_found() {
        let err: ApiError = DieselError::NotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
