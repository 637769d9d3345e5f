//! Unified error types for all layers of the application.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for all layers of Userhub.
///
/// Domain failures (`NotFound`, `Validation`, `Conflict`) surface to API
/// clients as 4xx responses. Every infrastructure variant maps to a 500.
#[derive(Error, Debug)]
pub enum HubError {
    // ============ Domain Errors ============
    /// Resource not found
    #[error("{resource_type} with ID {id} not found")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict error (e.g., duplicate email)
    #[error("Conflict: {0}")]
    Conflict(String),

    // ============ Infrastructure Errors ============
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Redis/Cache error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HubError {
    /// Returns the HTTP status code for this error.
    ///
    /// Duplicate emails are reported as bad requests rather than 409 so that
    /// existing API clients keep working.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation(_) | Self::Conflict(_) => 400,
            Self::Database(_)
            | Self::Cache(_)
            | Self::Configuration(_)
            | Self::Internal(_)
            | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true for errors that originate in infrastructure rather than
    /// in the caller's request.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Duplicate email. The text is fixed so that store-level unique
    /// violations and the service pre-check read the same.
    #[must_use]
    pub fn duplicate_email() -> Self {
        Self::Conflict("Email already exists".to_string())
    }

    /// Creates a cache error.
    #[must_use]
    pub fn cache<T: Into<String>>(message: T) -> Self {
        Self::Cache(message.into())
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for HubError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            // The only unique index on `users` is the email.
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::duplicate_email()
            }
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for HubError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {err}"))
    }
}

/// Serializable error response for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional field-level errors for validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-level validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
}

impl ErrorResponse {
    /// Message used in place of the error text for 5xx responses.
    pub const GENERIC_SERVER_MESSAGE: &'static str = "Internal server error";

    /// Creates a new error response from a `HubError`.
    ///
    /// Server-side failures never expose their underlying message.
    #[must_use]
    pub fn from_error(error: &HubError) -> Self {
        let message = if error.is_server_error() {
            Self::GENERIC_SERVER_MESSAGE.to_string()
        } else {
            error.to_string()
        };

        Self {
            code: error.error_code().to_string(),
            message,
            details: None,
        }
    }

    /// Sets field-level validation errors.
    #[must_use]
    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<&HubError> for ErrorResponse {
    fn from(error: &HubError) -> Self {
        Self::from_error(error)
    }
}
