//! Message Route Configuration
//!
//! The message surface is mounted at the root:
//!
//! - `GET  /messages/{chat_id}` - paginated history
//! - `POST /messages/{chat_id}` - send
//! - `PUT  /messages/{message_id}` - edit (author only)
//! - `DELETE /messages/{message_id}` - soft delete (author only)
//! - `POST /messages/{message_id}/react` - add reaction
//! - `DELETE /messages/{message_id}/react/{emoji}` - remove reaction
//! - `POST /messages/{message_id}/read` - mark read
//! - `POST /messages/{message_id}/pin`, `DELETE .../pin` - pin/unpin
//! - `GET  /messages/pins/{chat_id}` - list pins
//!
//! GET/POST interpret the path id as a chat id; PUT/DELETE as a message
//! id. They share one route pattern because the path shape is identical.

use axum::{routing, Router};

use crate::backend::messages::handlers;
use crate::backend::server::state::AppState;

/// Configure message routes
pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/messages/{id}",
            routing::get(handlers::list_messages)
                .post(handlers::send_message)
                .put(handlers::edit_message)
                .delete(handlers::delete_message),
        )
        .route(
            "/messages/{id}/react",
            routing::post(handlers::add_reaction),
        )
        .route(
            "/messages/{id}/react/{emoji}",
            routing::delete(handlers::remove_reaction),
        )
        .route("/messages/{id}/read", routing::post(handlers::mark_read))
        .route(
            "/messages/{id}/pin",
            routing::post(handlers::pin_message).delete(handlers::unpin_message),
        )
        .route(
            "/messages/pins/{id}",
            routing::get(handlers::list_pins),
        )
}
