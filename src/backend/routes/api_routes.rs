//! API Route Handlers
//!
//! Route configuration for the `/api` surface: authentication, profile,
//! chats, communities, invites, and friends.
//!
//! # Routes
//!
//! ## Public
//! - `POST /api/auth/signup` - user registration
//! - `POST /api/auth/login` - user login
//!
//! ## Protected (auth middleware)
//! - `GET /api/auth/me`, `PUT /api/users/me`, `PUT /api/users/me/push-token`
//! - `GET /api/chats`, `POST /api/chats/group`,
//!   `GET /api/chats/{chat_id}/members`, `PUT /api/chats/{chat_id}/nickname`
//! - `POST|GET /api/communities`, channel and membership management
//! - `POST /api/invites`, `POST /api/invites/{code}/redeem`
//! - `GET /api/friends`, friend request endpoints

use axum::{routing, Router};

use crate::backend::auth::{get_me, login, signup, update_me, update_my_push_token};
use crate::backend::chats::handlers as chats;
use crate::backend::communities::handlers as communities;
use crate::backend::friends::handlers as friends;
use crate::backend::server::state::AppState;

/// Routes that authenticate themselves (or need no identity)
pub fn public_api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", routing::post(signup))
        .route("/api/auth/login", routing::post(login))
}

/// Routes behind the bearer-token middleware
pub fn protected_api_routes() -> Router<AppState> {
    Router::new()
        // Current user
        .route("/api/auth/me", routing::get(get_me))
        .route("/api/users/me", routing::put(update_me))
        .route("/api/users/me/push-token", routing::put(update_my_push_token))
        // Chats
        .route("/api/chats", routing::get(chats::list_chats))
        .route("/api/chats/group", routing::post(chats::create_group))
        .route(
            "/api/chats/{chat_id}/members",
            routing::get(chats::list_members),
        )
        .route(
            "/api/chats/{chat_id}/nickname",
            routing::put(chats::set_nickname),
        )
        // Communities
        .route(
            "/api/communities",
            routing::post(communities::create_community).get(communities::list_communities),
        )
        .route(
            "/api/communities/{id}/channels",
            routing::get(communities::list_channels).post(communities::create_channel),
        )
        .route(
            "/api/communities/{id}/leave",
            routing::post(communities::leave_community),
        )
        .route(
            "/api/communities/{id}/transfer",
            routing::post(communities::transfer_ownership),
        )
        .route(
            "/api/communities/{id}/members/{user_id}",
            routing::delete(communities::kick_member),
        )
        // Channels
        .route(
            "/api/channels/{chat_id}",
            routing::put(communities::rename_channel).delete(communities::delete_channel),
        )
        // Invites
        .route("/api/invites", routing::post(communities::create_invite))
        .route(
            "/api/invites/{code}/redeem",
            routing::post(communities::redeem_invite),
        )
        // Friends
        .route("/api/friends", routing::get(friends::list_friends))
        .route(
            "/api/friends/request",
            routing::post(friends::send_friend_request),
        )
        .route(
            "/api/friends/requests",
            routing::get(friends::list_friend_requests),
        )
        .route(
            "/api/friends/respond",
            routing::post(friends::respond_to_friend_request),
        )
}
