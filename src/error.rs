//! Crate-wide error type and its HTTP representation.
//!
//! Every layer returns [`AppError`]. Handlers let axum turn it into a JSON body
//! of the form `{"error": {"code", "message", "details"}}` with a matching
//! status code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Serializable error payload.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// All failures the pipeline can surface.
///
/// `NotFound` is a terminal outcome of resolution; [`AppError::is_transient`]
/// separates it from failures that may succeed on a later attempt.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },
    /// A short code contains characters outside the codec alphabet.
    #[error("{message}")]
    InvalidToken { message: String, details: Value },
    #[error("{message}")]
    NotFound { message: String, details: Value },
    #[error("{message}")]
    Conflict { message: String, details: Value },
    /// The shared sequence store could not hand out a new ID block.
    #[error("{message}")]
    Allocation { message: String, details: Value },
    /// A durable insert or upsert failed.
    #[error("{message}")]
    StoreWrite { message: String, details: Value },
    /// The click event stream stayed unreachable after all retries.
    #[error("{message}")]
    StreamUnavailable { message: String, details: Value },
    /// A store call exceeded its deadline.
    #[error("{message}")]
    Timeout { message: String, details: Value },
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn invalid_token(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidToken {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn allocation(message: impl Into<String>, details: Value) -> Self {
        Self::Allocation {
            message: message.into(),
            details,
        }
    }
    pub fn store_write(message: impl Into<String>, details: Value) -> Self {
        Self::StoreWrite {
            message: message.into(),
            details,
        }
    }
    pub fn stream_unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::StreamUnavailable {
            message: message.into(),
            details,
        }
    }
    pub fn timeout(message: impl Into<String>, details: Value) -> Self {
        Self::Timeout {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Returns true for failures caused by unavailable or slow backends.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Allocation { .. }
                | Self::StreamUnavailable { .. }
                | Self::Timeout { .. }
                | Self::Internal { .. }
        )
    }

    fn parts(&self) -> (StatusCode, &'static str, &str, &Value) {
        match self {
            Self::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                details,
            ),
            Self::InvalidToken { message, details } => {
                (StatusCode::BAD_REQUEST, "invalid_token", message, details)
            }
            Self::NotFound { message, details } => {
                (StatusCode::NOT_FOUND, "not_found", message, details)
            }
            Self::Conflict { message, details } => {
                (StatusCode::CONFLICT, "conflict", message, details)
            }
            Self::Allocation { message, details } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "allocation_error",
                message,
                details,
            ),
            Self::StoreWrite { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_write_error",
                message,
                details,
            ),
            Self::StreamUnavailable { message, details } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "stream_unavailable",
                message,
                details,
            ),
            Self::Timeout { message, details } => {
                (StatusCode::GATEWAY_TIMEOUT, "timeout", message, details)
            }
            Self::Internal { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                message,
                details,
            ),
        }
    }

    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    /// Converts the error into its serializable payload.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (_, code, message, details) = self.parts();
        ErrorInfo {
            code,
            message: message.to_string(),
            details: details.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", e);
        AppError::internal("Database error", json!({}))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::bad_request("Request validation failed", json!({ "reason": e.to_string() }))
    }
}

/// Maps a failed insert/upsert to [`AppError::StoreWrite`], or
/// [`AppError::Conflict`] on a unique violation.
pub fn map_sqlx_write_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error()
        && db.is_unique_violation()
    {
        return AppError::conflict(
            "Unique constraint violation",
            json!({ "constraint": db.constraint() }),
        );
    }

    tracing::error!("Database write failed: {}", e);
    AppError::store_write("Database write failed", json!({ "reason": e.to_string() }))
}
