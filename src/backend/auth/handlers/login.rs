//! Login Handler
//!
//! This module implements the user authentication handler for
//! POST /api/auth/login.
//!
//! # Security
//!
//! - Passwords are verified using bcrypt
//! - Invalid credentials return 401 Unauthorized (no information leakage)
//! - JWT tokens are generated with 30-day expiration
//! - User passwords are never returned in responses

use axum::{extract::State, response::Json};
use bcrypt::verify;
use sqlx::PgPool;

use crate::backend::auth::handlers::types::{AuthResponse, LoginRequest};
use crate::backend::auth::sessions::create_token;
use crate::backend::auth::users::{get_user_by_email, get_user_by_username};
use crate::backend::error::ApiError;

/// Login handler
///
/// Looks the user up by username (or email when the identifier contains
/// an `@`), verifies the password, and returns a JWT token.
///
/// # Errors
///
/// * `401 Unauthorized` - unknown user or wrong password
/// * `503 Service Unavailable` - database not configured
pub async fn login(
    State(pool): State<Option<PgPool>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let pool = pool.ok_or(ApiError::Unavailable)?;
    tracing::debug!("Login request for: {}", request.username);

    let user = if request.username.contains('@') {
        get_user_by_email(&pool, &request.username).await
    } else {
        get_user_by_username(&pool, &request.username).await
    }?;

    let user = user.ok_or_else(|| {
        tracing::warn!("Login for unknown user: {}", request.username);
        ApiError::Unauthenticated
    })?;

    let valid = verify(&request.password, &user.password_hash).map_err(|e| {
        tracing::error!("Password verification error: {:?}", e);
        ApiError::Internal
    })?;

    if !valid {
        tracing::warn!("Invalid password for user: {}", request.username);
        return Err(ApiError::Unauthenticated);
    }

    let token = create_token(user.id, &user.username).map_err(|e| {
        tracing::error!("Failed to create token: {:?}", e);
        ApiError::Internal
    })?;

    tracing::info!("User logged in: {}", user.username);

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}
