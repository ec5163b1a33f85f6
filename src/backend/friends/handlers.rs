//! Friend Request HTTP Handlers
//!
//! Sending and answering friend requests. Accepting a request creates (or
//! reuses) the direct chat between the two users.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::backend::auth::users::get_user_by_username;
use crate::backend::chats::db::ensure_direct_chat;
use crate::backend::error::ApiError;
use crate::backend::friends::db::{self, FriendRequest, FriendRequestStatus, FriendView};
use crate::backend::middleware::auth::AuthUser;
use crate::backend::server::state::AppState;

/// Friend request body (POST /api/friends/request)
#[derive(Debug, Deserialize)]
pub struct SendFriendRequestBody {
    /// Handle of the user to befriend
    pub username: String,
}

/// Response body (POST /api/friends/respond)
#[derive(Debug, Deserialize)]
pub struct RespondFriendRequestBody {
    pub request_id: Uuid,
    pub accept: bool,
}

/// POST /api/friends/request - send a friend request by username
pub async fn send_friend_request(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Json(request): Json<SendFriendRequestBody>,
) -> Result<(StatusCode, Json<FriendRequest>), ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let to_user = get_user_by_username(pool, &request.username)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    if to_user.id == auth.user_id {
        return Err(ApiError::invalid("cannot send a friend request to yourself"));
    }

    if let Some(existing) = db::find_request_between(pool, auth.user_id, to_user.id).await? {
        match existing.status {
            FriendRequestStatus::Pending => {
                return Err(ApiError::Conflict("friend request already pending".to_string()));
            }
            FriendRequestStatus::Accepted => {
                return Err(ApiError::Conflict("already friends".to_string()));
            }
            FriendRequestStatus::Rejected => {} // a fresh request may follow a rejection
        }
    }

    let created = db::create_friend_request(pool, auth.user_id, to_user.id)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => {
                ApiError::Conflict("friend request already pending".to_string())
            }
            other => other,
        })?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/friends/requests - pending incoming requests
pub async fn list_friend_requests(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> Result<Json<Vec<FriendRequest>>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let requests = db::get_pending_friend_requests(pool, auth.user_id).await?;
    Ok(Json(requests))
}

/// POST /api/friends/respond - accept or reject a pending request.
///
/// Only the recipient may respond. Accepting materializes the friendship
/// as a direct chat between the two users.
pub async fn respond_to_friend_request(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Json(request): Json<RespondFriendRequestBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let friend_request = db::get_friend_request_by_id(pool, request.request_id)
        .await?
        .ok_or(ApiError::NotFound("friend request"))?;

    if friend_request.to_user_id != auth.user_id {
        return Err(ApiError::forbidden("only the recipient can respond"));
    }
    if friend_request.status != FriendRequestStatus::Pending {
        return Err(ApiError::Conflict("request already answered".to_string()));
    }

    if request.accept {
        db::set_request_status(pool, request.request_id, FriendRequestStatus::Accepted).await?;
        let chat = ensure_direct_chat(pool, friend_request.from_user_id, auth.user_id).await?;

        tracing::info!(
            "Friend request {} accepted, direct chat {}",
            request.request_id,
            chat.id
        );
        Ok(Json(serde_json::json!({
            "success": true,
            "chat": chat,
        })))
    } else {
        db::set_request_status(pool, request.request_id, FriendRequestStatus::Rejected).await?;
        Ok(Json(serde_json::json!({ "success": true })))
    }
}

/// GET /api/friends - accepted friendships
pub async fn list_friends(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> Result<Json<Vec<FriendView>>, ApiError> {
    let pool = state.db_pool.as_ref().ok_or(ApiError::Unavailable)?;

    let friends = db::list_friends(pool, auth.user_id).await?;
    Ok(Json(friends))
}
