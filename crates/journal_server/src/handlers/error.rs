use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use indexmap::IndexMap;
use journal_core::error::ApiError;
use journal_core::validate::ValidationReport;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub violations: IndexMap<String, String>,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        violations: IndexMap<String, String>,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Password hashing error: {0}")]
    Password(#[from] argon2::Error),

    #[error("Auth not configured")]
    AuthNotConfigured,
}

impl AppError {
    pub fn not_authorized() -> Self {
        AppError::Unauthorized("Not authorized".to_string())
    }

    pub fn entry_not_found() -> Self {
        AppError::NotFound("Entry not found".to_string())
    }
}

impl From<ValidationReport> for AppError {
    fn from(report: ValidationReport) -> Self {
        match ApiError::from(report) {
            ApiError::Validation {
                message,
                violations,
            } => AppError::Validation {
                message,
                violations,
            },
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, violations) = match self {
            AppError::Validation {
                message,
                violations,
            } => (StatusCode::BAD_REQUEST, message, violations),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message, IndexMap::new()),
            AppError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message, IndexMap::new()),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message, IndexMap::new()),
            internal => {
                error!("Request failed: {}", internal);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error".to_string(),
                    IndexMap::new(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                message,
                violations,
            }),
        )
            .into_response()
    }
}
