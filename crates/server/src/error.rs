//! Unified error handling for the catalog API.
//!
//! Provides a unified `AppError` type covering the full error taxonomy.
//! All route handlers return `Result<T, AppError>`; conversion to an HTTP
//! response happens in one place so internal detail is never leaked to
//! clients.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::{AuthError, TokenError};
use crate::services::images::ImageError;

/// A caller-facing, field-level validation message.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the offending input field.
    pub field: String,
    /// Human-readable message for that field.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application-level error type for the catalog API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, malformed, or invalid bearer token.
    #[error("unauthenticated: {0}")]
    Unauthenticated(&'static str),

    /// Valid token, insufficient role.
    #[error("forbidden")]
    Forbidden,

    /// Malformed or missing input fields.
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// Login or password-change failure. Deliberately non-specific to avoid
    /// account enumeration.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Referenced entity absent.
    #[error("not found: {0}")]
    NotFound(&'static str),

    /// Unique-constraint violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Request could not be read (bad multipart, oversized body).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Database operation failed.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Image lifecycle operation failed.
    #[error("image error: {0}")]
    Image(#[from] ImageError),

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a single-field validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::InvalidCredentials | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Repository(err) => match err {
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::InvalidEmail(_)
                | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
                AuthError::Token(TokenError::Invalid) => StatusCode::UNAUTHORIZED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Image(err) => match err {
                ImageError::EmptyPayload | ImageError::Decode(_) | ImageError::InvalidName => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caller-facing message. Internal detail stays in the logs.
    fn message(&self) -> String {
        match self {
            Self::Unauthenticated(msg) => (*msg).to_owned(),
            Self::Forbidden => "Access denied".to_owned(),
            Self::Validation(_) => "Validation failed".to_owned(),
            Self::InvalidCredentials | Self::Auth(AuthError::InvalidCredentials) => {
                "Invalid credentials".to_owned()
            }
            Self::NotFound(what) => (*what).to_owned(),
            Self::Conflict(msg) | Self::Repository(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::BadRequest(msg) => msg.clone(),
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(e) => e.to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::UserNotFound => "User not found".to_owned(),
                AuthError::UserAlreadyExists => "User already exists".to_owned(),
                AuthError::Repository(RepositoryError::Conflict(msg)) => msg.clone(),
                AuthError::Token(TokenError::Invalid) => "Invalid token".to_owned(),
                _ => "Internal server error".to_owned(),
            },
            Self::Image(err) => match err {
                ImageError::EmptyPayload => err.to_string(),
                ImageError::Decode(_) => "Unsupported or corrupt image".to_owned(),
                ImageError::InvalidName => "Invalid image file name".to_owned(),
                _ => "Image processing failed".to_owned(),
            },
            Self::Repository(_) | Self::Internal(_) => "Internal server error".to_owned(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "request error");
        }

        let body = match &self {
            Self::Validation(errors) => json!({ "errors": errors }),
            _ => json!({ "message": self.message() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            get_status(AppError::Unauthenticated("Access denied")),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(get_status(AppError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            get_status(AppError::validation("name", "Name is required")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::InvalidCredentials),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::NotFound("Product not found")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Conflict("SKU already exists".to_owned())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_conflict_maps_to_conflict() {
        let err = AppError::from(RepositoryError::Conflict("email already in use".to_owned()));
        assert_eq!(get_status(err), StatusCode::CONFLICT);
    }

    #[test]
    fn test_repository_database_errors_are_internal() {
        let err = AppError::from(RepositoryError::DataCorruption("bad role".to_owned()));
        assert_eq!(get_status(err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            get_status(AppError::from(AuthError::InvalidCredentials)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::from(AuthError::UserAlreadyExists)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::from(AuthError::UserNotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_image_error_mapping() {
        assert_eq!(
            get_status(AppError::from(ImageError::EmptyPayload)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::from(ImageError::InvalidName)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_detail_is_not_leaked() {
        let err = AppError::Internal("connection refused to 10.0.0.3:5432".to_owned());
        assert_eq!(err.message(), "Internal server error");
    }
}
