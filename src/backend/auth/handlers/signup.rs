//! Signup Handler
//!
//! This module implements the user registration handler for
//! POST /api/auth/signup.
//!
//! # Registration Process
//!
//! 1. Validate username and password shape
//! 2. Hash the password with bcrypt
//! 3. Insert the user row
//! 4. Generate a JWT token and return it with the user info

use axum::{extract::State, response::Json};
use sqlx::PgPool;

use crate::backend::auth::handlers::types::{AuthResponse, SignupRequest};
use crate::backend::auth::sessions::create_token;
use crate::backend::auth::users::create_user;
use crate::backend::error::ApiError;

/// Validate a candidate username: 3-30 chars, alphanumeric + underscore
fn validate_username(username: &str) -> Result<(), ApiError> {
    let len = username.chars().count();
    if !(3..=30).contains(&len) {
        return Err(ApiError::invalid("username must be 3-30 characters"));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ApiError::invalid(
            "username may only contain letters, digits, and underscores",
        ));
    }
    Ok(())
}

/// Signup handler
///
/// # Errors
///
/// * `400 Bad Request` - invalid username/password shape
/// * `409 Conflict` - username or email already taken
/// * `503 Service Unavailable` - database not configured
pub async fn signup(
    State(pool): State<Option<PgPool>>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let pool = pool.ok_or(ApiError::Unavailable)?;

    validate_username(&request.username)?;
    if request.password.chars().count() < 8 {
        return Err(ApiError::invalid("password must be at least 8 characters"));
    }
    if !request.email.contains('@') {
        return Err(ApiError::invalid("invalid email address"));
    }

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST).map_err(|e| {
        tracing::error!("Failed to hash password: {:?}", e);
        ApiError::Internal
    })?;

    let user = create_user(&pool, request.username, request.email, password_hash)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::Conflict("username or email already taken".to_string()),
            other => other,
        })?;

    let token = create_token(user.id, &user.username).map_err(|e| {
        tracing::error!("Failed to create token: {:?}", e);
        ApiError::Internal
    })?;

    tracing::info!("User registered: {} ({})", user.username, user.id);

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}
