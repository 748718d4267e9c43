use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    migration::TrackerError,
    repository::RepoError,
    validation::{FieldError, ValidationError},
};

/// AppError
///
/// The error taxonomy every handler returns. Each variant maps to exactly one HTTP status;
/// handlers use `?` and the conversion impls below do the classification.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No usable session on the request.
    #[error("authentication required")]
    Unauthenticated,
    /// Authenticated, but the role does not grant the capability.
    #[error("insufficient permissions")]
    Forbidden,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("resource not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotImplemented(String),
    /// Carries the server-side detail. Never sent to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

/// ErrorBody
///
/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Stable machine-readable code (`validation_failed`, `forbidden`, ...).
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "unauthenticated",
            AppError::Forbidden => "forbidden",
            AppError::Validation(_) => "validation_failed",
            AppError::NotFound => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::NotImplemented(_) => "not_implemented",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.code();

        let (message, details) = match self {
            AppError::Internal(detail) => {
                tracing::error!(detail = %detail, "request failed with an internal error");
                ("internal server error".to_string(), None)
            }
            AppError::Validation(err) => {
                let message = err.to_string();
                (message, Some(err.errors))
            }
            other => (other.to_string(), None),
        };

        (
            status,
            Json(ErrorBody {
                error,
                message,
                details,
            }),
        )
            .into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound,
            RepoError::Conflict(message) => AppError::Conflict(message),
            RepoError::Internal(detail) => AppError::Internal(detail),
        }
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::AlreadyRunning | TrackerError::NotRunning => {
                AppError::Conflict(err.to_string())
            }
            TrackerError::RollbackUnsupported => AppError::NotImplemented(err.to_string()),
        }
    }
}
