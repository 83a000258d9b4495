//! Error types for lectern-daemon

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Bootstrap seeding failed
    #[error("Bootstrap error: {0}")]
    Bootstrap(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage-specific errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// A record with the same id already exists
    #[error("Conflict: {0} already exists")]
    Conflict(String),
}

/// API-specific errors
///
/// The wrapped message of the client-facing variants is sent verbatim as
/// `detail` so clients can show it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Referenced record or key does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or out-of-range payload
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Caller lacks the permission for the action
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Caller identity could not be established
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization of a record failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::InvalidInput(detail.into())
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::NotFound(detail.into())
    }

    pub fn permission_denied() -> Self {
        Self::PermissionDenied("You do not have permission to perform this action.".to_string())
    }

    /// Message shown to the client
    pub fn detail(&self) -> String {
        match self {
            ApiError::NotFound(detail)
            | ApiError::InvalidInput(detail)
            | ApiError::PermissionDenied(detail)
            | ApiError::Unauthenticated(detail) => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ApiError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
            ApiError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "NOT_AUTHENTICATED"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Storage(StorageError::Conflict(_)) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            detail: self.detail(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
