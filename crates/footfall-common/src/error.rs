//! Centralized error taxonomy for Footfall.
//!
//! Mirrors the wire-visible error kinds in the spec exactly: every
//! variant maps to one response-frame `error` string and (for the thin
//! REST projection) one HTTP status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Core application error type used across all Footfall services.
#[derive(Debug, thiserror::Error)]
pub enum FootfallError {
    /// Schema/shape violation: missing field, wrong type, out-of-range
    /// scalar, malformed hex. No storage side effect.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Message not allowed in the session's current state.
    #[error("message not allowed in current session state: {0}")]
    State(String),

    /// Referenced device id is not registered.
    #[error("unknown device")]
    UnknownDevice,

    /// Canonicalization + SHA-256 + Ed25519 verification returned false.
    #[error("signature verification failed")]
    Signature,

    /// (device id, timestamp) already stored.
    #[error("duplicate submission")]
    Duplicate,

    /// Timestamp older than 7 days or more than 5 minutes in the future.
    #[error("timestamp out of acceptable range")]
    Temporal,

    /// Chain adapter failed. The local operation still succeeded; this is
    /// surfaced only as a warning in the response's chain sub-object, never
    /// as a top-level failure.
    #[error("chain adapter error: {0}")]
    Chain(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unclassified. The session is kept open.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl FootfallError {
    /// The taxonomy code from spec.md §7, embedded as a substring in every
    /// wire-visible error message (`error∋"signature"`, etc.).
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::State(_) => "state",
            Self::UnknownDevice => "unknown_device",
            Self::Signature => "signature",
            Self::Duplicate => "duplicate",
            Self::Temporal => "timestamp",
            Self::Chain(_) => "chain",
            Self::Database(_) => "database",
            Self::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Temporal => StatusCode::BAD_REQUEST,
            Self::State(_) => StatusCode::CONFLICT,
            Self::UnknownDevice => StatusCode::NOT_FOUND,
            Self::Signature => StatusCode::UNAUTHORIZED,
            Self::Duplicate => StatusCode::CONFLICT,
            Self::Chain(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

impl IntoResponse for FootfallError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            Self::Database(e) => {
                tracing::error!("database error: {e}");
                "an internal error occurred".to_string()
            }
            Self::Internal(e) => {
                tracing::error!("internal error: {e}");
                "an internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse { success: false, error: message };
        (status, axum::Json(body)).into_response()
    }
}

pub type FootfallResult<T> = Result<T, FootfallError>;
