use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::validate::ValidationReport;

/// Failure of a call against the remote journal service.
///
/// Every remote operation fails with exactly one of these variants, so callers
/// decide on retries and re-login by matching on the tag rather than by
/// inspecting message strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Bad input shape or constraint. User-correctable, never retried.
    #[error("{message}")]
    Validation {
        message: String,
        violations: IndexMap<String, String>,
    },

    /// Credential missing, invalid or expired. Forces a re-login.
    #[error("Session expired. Please log in again.")]
    Auth,

    /// Transport failure or server-side error. Transient.
    #[error("Network error: {0}")]
    Network(String),

    /// No response within the request timeout. Transient.
    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The entry vanished or belongs to someone else.
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    /// Shorthand for a validation error without field-level detail.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            violations: IndexMap::new(),
        }
    }

    /// Whether an automatic retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout(_))
    }

    /// Whether the caller must drop its credential and log in again.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth)
    }

    /// Variant name, for logs and serialized errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "ValidationError",
            ApiError::Auth => "AuthError",
            ApiError::Network(_) => "NetworkError",
            ApiError::Timeout(_) => "NetworkError",
            ApiError::NotFound(_) => "NotFoundError",
        }
    }
}

impl From<ValidationReport> for ApiError {
    fn from(report: ValidationReport) -> Self {
        ApiError::Validation {
            message: report.summary(),
            violations: report
                .violations
                .iter()
                .map(|(field, violation)| (field.as_str().to_string(), violation.to_string()))
                .collect(),
        }
    }
}

/// Unified error type for local journal operations
#[derive(Debug, Error)]
pub enum JournalError {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // Date errors
    #[error("Invalid date format: '{0}'. Try 'today', 'yesterday', 'last friday', '3 days ago', or 'YYYY-MM-DD'")]
    InvalidDateFormat(String),

    // Config errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    // Draft store errors
    #[error("Draft store error: {0}")]
    Draft(String),

    #[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    // Entry errors
    #[error("{}", .0.summary())]
    Validation(ValidationReport),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl JournalError {
    /// The remote error behind this one, if any.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            JournalError::Api(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for journal operations
pub type Result<T> = std::result::Result<T, JournalError>;

/// A serializable representation of an error, for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Error kind/variant name
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Field-level violations (validation errors only)
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub violations: IndexMap<String, String>,
}

impl From<&ApiError> for SerializableError {
    fn from(err: &ApiError) -> Self {
        let violations = match err {
            ApiError::Validation { violations, .. } => violations.clone(),
            _ => IndexMap::new(),
        };
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            violations,
        }
    }
}

impl From<&JournalError> for SerializableError {
    fn from(err: &JournalError) -> Self {
        match err {
            JournalError::Api(api) => SerializableError::from(api),
            JournalError::Validation(report) => {
                SerializableError::from(&ApiError::from(report.clone()))
            }
            other => Self {
                kind: "LocalError".to_string(),
                message: other.to_string(),
                violations: IndexMap::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ApiError::Network("connection refused".into()).is_transient());
        assert!(ApiError::Timeout(Duration::from_secs(30)).is_transient());
        assert!(!ApiError::Auth.is_transient());
        assert!(!ApiError::NotFound("Entry not found".into()).is_transient());
        assert!(!ApiError::validation("Please provide title").is_transient());
    }

    #[test]
    fn test_auth_message() {
        assert_eq!(
            ApiError::Auth.to_string(),
            "Session expired. Please log in again."
        );
        assert!(ApiError::Auth.is_auth());
    }

    #[test]
    fn test_serializable_keeps_violations() {
        let mut violations = IndexMap::new();
        violations.insert("title".to_string(), "is required".to_string());
        let err = ApiError::Validation {
            message: "Invalid entry".into(),
            violations,
        };

        let ser = SerializableError::from(&err);
        assert_eq!(ser.kind, "ValidationError");
        assert_eq!(ser.violations.get("title").unwrap(), "is required");
    }
}
