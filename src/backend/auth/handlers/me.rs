//! Current User Handlers
//!
//! GET /api/auth/me plus the profile and push-token update endpoints.

use axum::{extract::State, response::Json};
use sqlx::PgPool;

use crate::backend::auth::handlers::types::{
    PushTokenRequest, UpdateProfileRequest, UserResponse,
};
use crate::backend::auth::users;
use crate::backend::error::ApiError;
use crate::backend::middleware::auth::AuthUser;

/// Get the authenticated user's profile (GET /api/auth/me)
pub async fn get_me(
    State(pool): State<Option<PgPool>>,
    AuthUser(auth): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let pool = pool.ok_or(ApiError::Unavailable)?;

    let user = users::get_user_by_id(&pool, auth.user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    Ok(Json(user.into()))
}

/// Update display name and avatar (PUT /api/users/me)
pub async fn update_me(
    State(pool): State<Option<PgPool>>,
    AuthUser(auth): AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let pool = pool.ok_or(ApiError::Unavailable)?;

    if let Some(name) = &request.display_name {
        if name.chars().count() > 64 {
            return Err(ApiError::invalid("display name too long"));
        }
    }

    let user =
        users::update_profile(&pool, auth.user_id, request.display_name, request.avatar_url)
            .await?;

    Ok(Json(user.into()))
}

/// Register or clear the device push token (PUT /api/users/me/push-token)
pub async fn update_my_push_token(
    State(pool): State<Option<PgPool>>,
    AuthUser(auth): AuthUser,
    Json(request): Json<PushTokenRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = pool.ok_or(ApiError::Unavailable)?;

    users::update_push_token(&pool, auth.user_id, request.push_token).await?;

    Ok(Json(serde_json::json!({ "success": true })))
}
