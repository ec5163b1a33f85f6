//! API Error Taxonomy
//!
//! Every expected failure in the API maps to one of these variants so the
//! HTTP layer can respond deterministically:
//!
//! - `NotFound` - chat/message/user absent
//! - `Forbidden` - authenticated but not authorized (not a member, not the author)
//! - `InvalidInput` - malformed, oversized, or empty content
//! - `Conflict` - unique-constraint violations that are genuine errors
//! - `Expired` - invite exhausted or past its expiry
//! - `Unavailable` - storage contention; the caller should retry
//! - `Unauthenticated` - missing or invalid token
//! - `Internal` - anything unexpected; detail is logged, never returned
//!
//! Duplicate inserts on idempotent-by-design operations (reactions, read
//! receipts, pins) are absorbed by the engine and never surface here.

use axum::http::StatusCode;
use thiserror::Error;

/// Backend API error
#[derive(Debug, Error)]
pub enum ApiError {
    /// The addressed entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Authenticated but not allowed to perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// Request content failed validation
    #[error("{0}")]
    InvalidInput(String),

    /// A uniqueness rule was violated on a non-idempotent operation
    #[error("{0}")]
    Conflict(String),

    /// Invite is exhausted or expired
    #[error("{0}")]
    Expired(String),

    /// The durable store is temporarily unavailable; retryable
    #[error("service temporarily unavailable")]
    Unavailable,

    /// Missing or invalid credentials
    #[error("authentication required")]
    Unauthenticated,

    /// Unexpected failure; internal detail stays in the logs
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Expired(_) => StatusCode::GONE,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convenience constructor for authorization failures
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    /// Convenience constructor for validation failures
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::InvalidInput(message.into())
    }
}

impl From<sqlx::Error> for ApiError {
    /// Classify storage errors into the taxonomy.
    ///
    /// Pool exhaustion and I/O failures degrade to `Unavailable` so clients
    /// can distinguish retryable conditions; unique violations become
    /// `Conflict`; everything else is an internal failure with the detail
    /// kept in the logs.
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ApiError::NotFound("record"),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                tracing::warn!("storage unavailable: {:?}", err);
                ApiError::Unavailable
            }
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::Conflict("already exists".to_string())
            }
            _ => {
                tracing::error!("database error: {:?}", err);
                ApiError::Internal
            }
        }
    }
}
