//! Error Types for the Folio API
//!
//! This module defines error handling for the HTTP layer:
//! - `ErrorCode` for categorizing failures and choosing a status code
//! - `ApiError`, the JSON error body every handler returns
//! - conversions from the domain taxonomy in `folio_core`
//!
//! Backend failures keep their underlying message in `details`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use folio_core::{FolioError, ObjectStoreError, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Missing, invalid or expired credential, or unknown subject
    Unauthorized,

    /// Login with a wrong email or password
    InvalidCredentials,

    /// Request body could not be read or parsed
    InvalidBody,

    /// Request validation failed
    ValidationFailed,

    /// Path or field has the wrong format
    InvalidFormat,

    /// Requested entity does not exist
    EntityNotFound,

    /// Entity with the same unique field already exists
    EntityAlreadyExists,

    InternalError,

    DatabaseError,

    CacheError,

    ObjectStoreError,

    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized | ErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,

            ErrorCode::InvalidBody | ErrorCode::ValidationFailed | ErrorCode::InvalidFormat => {
                StatusCode::BAD_REQUEST
            }

            ErrorCode::EntityNotFound => StatusCode::NOT_FOUND,

            ErrorCode::EntityAlreadyExists => StatusCode::CONFLICT,

            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::InternalError
            | ErrorCode::DatabaseError
            | ErrorCode::CacheError
            | ErrorCode::ObjectStoreError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "Unauthorized",
            ErrorCode::InvalidCredentials => "Invalid Email or Password",
            ErrorCode::InvalidBody => "FAILED TO READ BODY",
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::EntityAlreadyExists => "Entity already exists",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::CacheError => "Cache operation failed",
            ErrorCode::ObjectStoreError => "Object store operation failed",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// JSON error body: `{"code": "...", "error": "...", "details": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub error: String,

    /// Underlying failure text, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            error: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    /// The one response every auth gate rejection collapses to.
    pub fn unauthorized() -> Self {
        Self::from_code(ErrorCode::Unauthorized)
    }

    pub fn invalid_credentials() -> Self {
        Self::from_code(ErrorCode::InvalidCredentials)
    }

    pub fn invalid_body() -> Self {
        Self::from_code(ErrorCode::InvalidBody)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::ValidationFailed,
            format!("Required field missing: {}", field),
        )
    }

    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Invalid {}: expected {}", field, expected),
        )
    }

    pub fn entity_not_found(entity_type: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EntityNotFound,
            format!("{} not found: {}", entity_type, id),
        )
    }

    pub fn entity_already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EntityAlreadyExists, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.error)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM DOMAIN ERRORS
// ============================================================================

impl From<FolioError> for ApiError {
    fn from(err: FolioError) -> Self {
        match err {
            FolioError::Storage(StorageError::NotFound { entity_type, id }) => {
                ApiError::entity_not_found(capitalized(entity_type.as_str()).as_str(), id)
            }
            FolioError::Storage(StorageError::Duplicate {
                entity_type,
                field,
                value,
            }) => ApiError::entity_already_exists(format!(
                "{} with this {} already exists",
                capitalized(entity_type.as_str()),
                field
            ))
            .with_details(value),
            FolioError::Storage(StorageError::Backend { reason }) => {
                tracing::error!(error = %reason, "Database error");
                ApiError::from_code(ErrorCode::DatabaseError).with_details(reason)
            }
            FolioError::Cache(e) => {
                tracing::error!(error = %e, "Cache error");
                ApiError::from_code(ErrorCode::CacheError).with_details(e.to_string())
            }
            FolioError::ObjectStore(ObjectStoreError::NotFound { key }) => {
                ApiError::entity_not_found("Image", key)
            }
            FolioError::ObjectStore(e @ ObjectStoreError::InvalidKey { .. }) => {
                ApiError::invalid_format("image id", "a flat object name")
                    .with_details(e.to_string())
            }
            FolioError::ObjectStore(e @ ObjectStoreError::Backend { .. }) => {
                tracing::error!(error = %e, "Object store error");
                ApiError::from_code(ErrorCode::ObjectStoreError).with_details(e.to_string())
            }
            FolioError::Validation(e) => ApiError::validation_failed(e.to_string()),
            FolioError::Config(e) => {
                tracing::error!(error = %e, "Configuration error");
                ApiError::internal_error(e.to_string())
            }
        }
    }
}

/// Convert from deadpool_postgres::PoolError to ApiError.
impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!("Connection pool error: {:?}", err);

        match err {
            deadpool_postgres::PoolError::Closed => {
                ApiError::service_unavailable("Database connection pool is closed")
            }
            other => ApiError::database_error("Failed to acquire database connection")
                .with_details(other.to_string()),
        }
    }
}

fn capitalized(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
