//! Community HTTP Handlers
//!
//! Community and channel CRUD plus invites. Channel create/rename/delete
//! are owner-restricted; membership mutation rules keep the owner on the
//! roster until ownership is transferred.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::communities::{db, invites};
use crate::backend::error::ApiError;
use crate::backend::membership::{is_community_member, load_chat};
use crate::backend::middleware::auth::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::chat::{Chat, ChatKind};
use crate::shared::community::{Community, Invite};

/// Community creation request (POST /api/communities)
#[derive(Debug, Deserialize)]
pub struct CreateCommunityRequest {
    pub name: String,
}

/// Channel creation/rename request
#[derive(Debug, Deserialize)]
pub struct ChannelRequest {
    pub name: String,
}

/// Ownership transfer request (POST /api/communities/{id}/transfer)
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub new_owner_id: Uuid,
}

/// Invite creation request (POST /api/invites)
#[derive(Debug, Deserialize)]
pub struct CreateInviteRequest {
    pub community_id: Uuid,
    pub max_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

async fn require_community(pool: &PgPool, community_id: Uuid) -> Result<Community, ApiError> {
    db::get_community(pool, community_id)
        .await?
        .ok_or(ApiError::NotFound("community"))
}

fn require_owner(community: &Community, user_id: Uuid) -> Result<(), ApiError> {
    if community.owner_id != user_id {
        return Err(ApiError::forbidden("only the community owner may do this"));
    }
    Ok(())
}

/// Resolve a channel chat and its community for the channel-scoped routes
async fn require_channel(
    pool: &PgPool,
    chat_id: Uuid,
) -> Result<(Chat, Community), ApiError> {
    let chat = load_chat(pool, chat_id)
        .await?
        .ok_or(ApiError::NotFound("channel"))?;
    let community_id = match chat.kind {
        ChatKind::Channel { community_id } => community_id,
        _ => return Err(ApiError::NotFound("channel")),
    };
    let community = require_community(pool, community_id).await?;
    Ok((chat, community))
}

/// POST /api/communities - create with its default channel
pub async fn create_community(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Json(request): Json<CreateCommunityRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::invalid("community name cannot be empty"));
    }

    let (community, default_channel) = db::create_community(pool, name, auth.user_id).await?;

    tracing::info!(
        "Community {} created by {} with default channel {}",
        community.id,
        auth.user_id,
        default_channel.id
    );

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "community": community,
            "default_channel": default_channel,
        })),
    ))
}

/// GET /api/communities - the caller's communities
pub async fn list_communities(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> Result<Json<Vec<Community>>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let communities = db::list_communities_for_user(pool, auth.user_id).await?;
    Ok(Json(communities))
}

/// GET /api/communities/{id}/channels
pub async fn list_channels(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(community_id): Path<Uuid>,
) -> Result<Json<Vec<Chat>>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    require_community(pool, community_id).await?;
    if !is_community_member(pool, community_id, auth.user_id).await? {
        return Err(ApiError::forbidden("not a member of this community"));
    }

    let channels = db::list_channels(pool, community_id).await?;
    Ok(Json(channels))
}

/// POST /api/communities/{id}/channels - owner only
pub async fn create_channel(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(community_id): Path<Uuid>,
    Json(request): Json<ChannelRequest>,
) -> Result<(StatusCode, Json<Chat>), ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let community = require_community(pool, community_id).await?;
    require_owner(&community, auth.user_id)?;

    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::invalid("channel name cannot be empty"));
    }

    let channel = db::create_channel(pool, community_id, name).await?;
    Ok((StatusCode::CREATED, Json(channel)))
}

/// PUT /api/channels/{chat_id} - rename, owner only
pub async fn rename_channel(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(chat_id): Path<Uuid>,
    Json(request): Json<ChannelRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let (_, community) = require_channel(pool, chat_id).await?;
    require_owner(&community, auth.user_id)?;

    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::invalid("channel name cannot be empty"));
    }

    db::rename_channel(pool, chat_id, name).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// DELETE /api/channels/{chat_id} - owner only, never the last channel
pub async fn delete_channel(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let (_, community) = require_channel(pool, chat_id).await?;
    require_owner(&community, auth.user_id)?;

    let deleted = db::delete_channel(pool, community.id, chat_id).await?;
    if !deleted {
        return Err(ApiError::invalid(
            "cannot delete the community's last channel",
        ));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// POST /api/communities/{id}/leave
///
/// The owner cannot leave without first transferring ownership; the
/// community must always keep an owning member.
pub async fn leave_community(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(community_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let community = require_community(pool, community_id).await?;
    if community.owner_id == auth.user_id {
        return Err(ApiError::invalid(
            "transfer ownership before leaving the community",
        ));
    }

    db::remove_member(pool, community_id, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// POST /api/communities/{id}/transfer - owner only, target must be a member
pub async fn transfer_ownership(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(community_id): Path<Uuid>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let community = require_community(pool, community_id).await?;
    require_owner(&community, auth.user_id)?;

    if !is_community_member(pool, community_id, request.new_owner_id).await? {
        return Err(ApiError::invalid("new owner must be a community member"));
    }

    db::transfer_ownership(pool, community_id, request.new_owner_id).await?;
    tracing::info!(
        "Community {} ownership transferred from {} to {}",
        community_id,
        auth.user_id,
        request.new_owner_id
    );
    Ok(Json(serde_json::json!({ "success": true })))
}

/// DELETE /api/communities/{id}/members/{user_id} - kick, owner only
pub async fn kick_member(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path((community_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let community = require_community(pool, community_id).await?;
    require_owner(&community, auth.user_id)?;

    // The owner stays on the roster until ownership moves
    if user_id == community.owner_id {
        return Err(ApiError::invalid("the owner cannot be removed"));
    }

    db::remove_member(pool, community_id, user_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// POST /api/invites - create an invite (any member)
pub async fn create_invite(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Json(request): Json<CreateInviteRequest>,
) -> Result<(StatusCode, Json<Invite>), ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    require_community(pool, request.community_id).await?;
    if !is_community_member(pool, request.community_id, auth.user_id).await? {
        return Err(ApiError::forbidden("not a member of this community"));
    }
    if matches!(request.max_uses, Some(max) if max <= 0) {
        return Err(ApiError::invalid("max_uses must be positive"));
    }

    let invite = invites::create_invite(
        pool,
        request.community_id,
        auth.user_id,
        request.max_uses,
        request.expires_at,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(invite)))
}

/// POST /api/invites/{code}/redeem - join via invite
pub async fn redeem_invite(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(code): Path<String>,
) -> Result<Json<Community>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let community = invites::redeem_invite(pool, &code, auth.user_id).await?;
    tracing::info!("User {} joined community {} via invite", auth.user_id, community.id);
    Ok(Json(community))
}
