//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error body is JSON: `{"error": "<message>"}`, plus a `violations`
//! array for validation failures.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::{ServiceError, ValidationError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Shop operation failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    violations: Vec<ValidationError>,
}

impl AppError {
    /// Whether this is a server-side failure.
    fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Service(ServiceError::Repository(_))
                | Self::Auth(
                    AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenSigning(_)
                )
        )
    }

    fn status(&self) -> StatusCode {
        if self.is_internal() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        match self {
            Self::Service(err) => match err {
                ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
                ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
                ServiceError::VersionConflict(_) | ServiceError::IllegalState(_) => {
                    StatusCode::CONFLICT
                }
                ServiceError::CouponAlreadyUsed(_) | ServiceError::DuplicateCoupon(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                AuthError::UsernameTaken => StatusCode::CONFLICT,
                AuthError::InvalidUsername(_) | AuthError::BlankName | AuthError::WeakPassword(_) => {
                    StatusCode::BAD_REQUEST
                }
                AuthError::MemberNotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn violations(&self) -> Vec<ValidationError> {
        match self {
            Self::Service(ServiceError::Validation(violations)) => violations.clone(),
            Self::Auth(AuthError::InvalidUsername(_)) => {
                vec![ValidationError::of("username", "invalid")]
            }
            Self::Auth(AuthError::BlankName) => vec![ValidationError::of("name", "blank")],
            Self::Auth(AuthError::WeakPassword(_)) => {
                vec![ValidationError::of("password", "too_short")]
            }
            _ => Vec::new(),
        }
    }

    /// Client-facing message. Internal details are never exposed.
    fn message(&self) -> String {
        if self.is_internal() {
            return "Internal server error".to_string();
        }
        match self {
            Self::Auth(AuthError::InvalidCredentials) => "Invalid credentials".to_string(),
            Self::Auth(AuthError::InvalidToken) => "Authentication required".to_string(),
            Self::Auth(err) => err.to_string(),
            Self::Service(err) => err.to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_internal() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            error: self.message(),
            violations: self.violations(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated member.
pub fn set_sentry_user(username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}
