//! Backend Error Types
//!
//! This module defines the API error taxonomy and its conversion to HTTP
//! responses. Handlers and the message engine return these errors so the
//! route layer maps outcomes to status codes deterministically.

pub mod conversion;
pub mod types;

pub use types::ApiError;
