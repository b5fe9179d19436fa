use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::username::UsernameError;
use crate::services::{BootcampError, IdentityError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ValidationError(String),

    Conflict(String),

    InternalError(String),

    Unauthorized(String),

    Forbidden(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Validation(report) => ApiError::ValidationError(report.to_string()),
            IdentityError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid username or password".to_string())
            }
            IdentityError::NotFound(id) => ApiError::not_found("Identity", id),
            e @ IdentityError::KindMismatch { .. } => ApiError::ValidationError(e.to_string()),
            IdentityError::Conflict(msg) => ApiError::Conflict(msg),
            IdentityError::Username(e @ UsernameError::Exhausted { .. }) => {
                ApiError::Conflict(e.to_string())
            }
            IdentityError::Username(e @ UsernameError::Lookup(_)) => {
                ApiError::DatabaseError(e.to_string())
            }
            IdentityError::Database(msg) => ApiError::DatabaseError(msg),
            IdentityError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<BootcampError> for ApiError {
    fn from(err: BootcampError) -> Self {
        match err {
            BootcampError::Validation(report) => ApiError::ValidationError(report.to_string()),
            BootcampError::NotFound(id) => ApiError::not_found("Bootcamp", id),
            BootcampError::Conflict(msg) => ApiError::Conflict(msg),
            BootcampError::Database(msg) => ApiError::DatabaseError(msg),
            BootcampError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IdentityKind;

    #[test]
    fn identity_errors_map_to_http_statuses() {
        let cases = [
            (IdentityError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (
                IdentityError::validation("username", "Please fill in a username"),
                StatusCode::BAD_REQUEST,
            ),
            (IdentityError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (IdentityError::Conflict("taken".into()), StatusCode::CONFLICT),
            (
                IdentityError::KindMismatch {
                    expected: IdentityKind::Applicant,
                    found: IdentityKind::User,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                IdentityError::Username(UsernameError::Exhausted {
                    base: "alex".into(),
                    attempts: 3,
                }),
                StatusCode::CONFLICT,
            ),
            (
                IdentityError::Database("locked".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn bootcamp_not_found_names_the_resource() {
        let err = ApiError::from(BootcampError::NotFound("abc".into()));
        assert_eq!(err.to_string(), "Not found: Bootcamp abc not found");
    }
}
