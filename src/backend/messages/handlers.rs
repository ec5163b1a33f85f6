//! Message HTTP Handlers
//!
//! Thin translation layer from the HTTP surface to the lifecycle engine.
//! All authorization and state rules live in the engine; handlers only
//! extract identity and parameters and shape responses.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::backend::error::ApiError;
use crate::backend::messages::engine::{self, SendMessageRequest};
use crate::backend::middleware::auth::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::message::MessageView;

/// Query parameters for message listing
#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    /// Page size, clamped into 1..=100 (default 50)
    pub limit: Option<i64>,
    /// Exclusive cursor: return only messages older than this message id
    pub before: Option<Uuid>,
}

/// Edit request body (PUT /messages/{message_id})
#[derive(Debug, Deserialize)]
pub struct EditMessageRequest {
    pub content: String,
}

/// Reaction request body (POST /messages/{message_id}/react)
#[derive(Debug, Deserialize)]
pub struct ReactRequest {
    pub emoji: Option<String>,
}

/// GET /messages/{chat_id} - paginated history, oldest to newest
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(chat_id): Path<Uuid>,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let messages =
        engine::list_messages(pool, chat_id, auth.user_id, query.limit, query.before).await?;
    Ok(Json(messages))
}

/// POST /messages/{chat_id} - send a message
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(chat_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageView>), ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let message = engine::send_message(
        pool,
        &state.realtime,
        &state.push,
        chat_id,
        auth.user_id,
        request,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// PUT /messages/{message_id} - edit (author only)
pub async fn edit_message(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(message_id): Path<Uuid>,
    Json(request): Json<EditMessageRequest>,
) -> Result<Json<MessageView>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let message = engine::edit_message(
        pool,
        &state.realtime,
        message_id,
        auth.user_id,
        &request.content,
    )
    .await?;
    Ok(Json(message))
}

/// DELETE /messages/{message_id} - soft delete (author only)
pub async fn delete_message(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(message_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let deleted_at =
        engine::delete_message(pool, &state.realtime, message_id, auth.user_id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "deleted_at": deleted_at,
    })))
}

/// POST /messages/{message_id}/react - add a reaction
pub async fn add_reaction(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(message_id): Path<Uuid>,
    Json(request): Json<ReactRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let emoji = request
        .emoji
        .ok_or_else(|| ApiError::invalid("missing emoji"))?;
    let reactions =
        engine::add_reaction(pool, &state.realtime, message_id, auth.user_id, &emoji).await?;
    Ok(Json(serde_json::json!({ "reactions": reactions })))
}

/// DELETE /messages/{message_id}/react/{emoji} - remove a reaction
pub async fn remove_reaction(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path((message_id, emoji)): Path<(Uuid, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let reactions =
        engine::remove_reaction(pool, &state.realtime, message_id, auth.user_id, &emoji).await?;
    Ok(Json(serde_json::json!({ "reactions": reactions })))
}

/// POST /messages/{message_id}/read - mark read (first read wins)
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(message_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let read_at = engine::mark_read(pool, &state.realtime, message_id, auth.user_id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "read_at": read_at,
    })))
}

/// POST /messages/{message_id}/pin - pin a message
pub async fn pin_message(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(message_id): Path<Uuid>,
) -> Result<Json<MessageView>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let message = engine::pin_message(pool, &state.realtime, message_id, auth.user_id).await?;
    Ok(Json(message))
}

/// DELETE /messages/{message_id}/pin - unpin a message
pub async fn unpin_message(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(message_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    engine::unpin_message(pool, &state.realtime, message_id, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// GET /messages/pins/{chat_id} - list a chat's pinned messages
pub async fn list_pins(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let pins = engine::list_pins(pool, chat_id, auth.user_id).await?;
    Ok(Json(pins))
}
