//! Chat HTTP Handlers
//!
//! Listing, group creation, rosters, and per-chat nicknames. Channel
//! creation lives with the communities module.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::backend::chats::db;
use crate::backend::error::ApiError;
use crate::backend::membership::{check_chat_access, ChatAccess};
use crate::backend::middleware::auth::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::chat::{Chat, ChatKind};

/// Group creation request (POST /api/chats/group)
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub member_ids: Vec<Uuid>,
}

/// Nickname request (PUT /api/chats/{chat_id}/nickname)
#[derive(Debug, Deserialize)]
pub struct NicknameRequest {
    /// New nickname; `null` clears it
    pub nickname: Option<String>,
}

/// GET /api/chats - every chat visible to the caller
pub async fn list_chats(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> Result<Json<Vec<Chat>>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let chats = db::list_chats_for_user(pool, auth.user_id).await?;
    Ok(Json(chats))
}

/// POST /api/chats/group - create a group chat
pub async fn create_group(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Chat>), ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::invalid("group name cannot be empty"));
    }

    let chat = db::create_group_chat(pool, auth.user_id, name, &request.member_ids).await?;
    Ok((StatusCode::CREATED, Json(chat)))
}

/// GET /api/chats/{chat_id}/members - roster with profiles
pub async fn list_members(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Vec<db::MemberView>>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let chat = match check_chat_access(pool, chat_id, auth.user_id).await? {
        ChatAccess::Member(chat) => chat,
        ChatAccess::NotFound => return Err(ApiError::NotFound("chat")),
        ChatAccess::NotMember => return Err(ApiError::forbidden("not a member of this chat")),
    };

    let members = db::list_members(pool, &chat).await?;
    Ok(Json(members))
}

/// PUT /api/chats/{chat_id}/nickname - set the caller's nickname
pub async fn set_nickname(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(chat_id): Path<Uuid>,
    Json(request): Json<NicknameRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let chat = match check_chat_access(pool, chat_id, auth.user_id).await? {
        ChatAccess::Member(chat) => chat,
        ChatAccess::NotFound => return Err(ApiError::NotFound("chat")),
        ChatAccess::NotMember => return Err(ApiError::forbidden("not a member of this chat")),
    };

    // Nicknames live on roster rows; channels have no per-chat roster
    if matches!(chat.kind, ChatKind::Channel { .. }) {
        return Err(ApiError::invalid("channels do not support nicknames"));
    }

    if let Some(nickname) = &request.nickname {
        if nickname.chars().count() > 32 {
            return Err(ApiError::invalid("nickname too long"));
        }
    }

    let updated =
        db::set_nickname(pool, chat_id, auth.user_id, request.nickname.as_deref()).await?;
    if !updated {
        return Err(ApiError::forbidden("not a member of this chat"));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
