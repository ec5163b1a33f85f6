//! WebSocket Gateway
//!
//! Each client holds one persistent connection per device. The handshake
//! carries a bearer token (query parameter or Authorization header); an
//! invalid token refuses the connection before any event is processed.
//! After that, the connection moves through join/leave room requests,
//! typing signals, and receives every event its joined rooms produce.
//!
//! Business-logic failures (unknown chat, not a member) are reported as
//! `error` frames scoped to the offending request; only authentication
//! failure terminates the connection.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{Sink, SinkExt, StreamExt};
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::backend::auth::sessions::verify_token;
use crate::backend::membership::{authorize_join, JoinDecision};
use crate::backend::server::state::AppState;
use crate::shared::event::{
    ClientEvent, PresenceStatus, RoomEvent, Scope, ServerEvent,
};
use crate::shared::message::MessageView;

/// Handshake query parameters
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Bearer token; alternative to the Authorization header
    pub token: Option<String>,
}

/// Gateway upgrade handler (GET /ws)
///
/// Verifies the token before completing the upgrade; a missing or invalid
/// token answers 401 and no socket is ever opened.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let token = params.token.or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_string)
    });

    let token = match token {
        Some(token) => token,
        None => {
            tracing::warn!("[Gateway] Handshake without token");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };

    let user_id = match verify_token(&token) {
        Ok(claims) => match Uuid::parse_str(&claims.sub) {
            Ok(user_id) => user_id,
            Err(_) => return StatusCode::UNAUTHORIZED.into_response(),
        },
        Err(e) => {
            tracing::warn!("[Gateway] Handshake with invalid token: {:?}", e);
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

/// Per-connection event loop.
///
/// Owns the connection's joined-room set and the write half of the socket;
/// everything the connection does funnels through this one task, so no
/// locking is needed beyond the shared registries.
async fn handle_socket(socket: WebSocket, state: AppState, user_id: Uuid) {
    let conn_id = Uuid::new_v4();
    let realtime = state.realtime.clone();
    let (mut sink, mut stream) = socket.split();
    let mut hub_rx = realtime.hub.subscribe();
    let mut joined: HashSet<Uuid> = HashSet::new();

    tracing::debug!("[Gateway] Connection {} opened for user {}", conn_id, user_id);

    // Online fires only on the 0 -> 1 connection transition
    if realtime.presence.connect(user_id, conn_id) {
        realtime.hub.broadcast(RoomEvent::global(ServerEvent::PresenceUpdate {
            user_id,
            status: PresenceStatus::Online,
        }));
    }

    // A fresh connection has no event history; hand it the full snapshot
    let snapshot = ServerEvent::PresenceInitialState {
        online: realtime.presence.online_users(),
    };
    if send_frame(&mut sink, &snapshot).await.is_err() {
        finish_connection(&state, user_id, conn_id);
        return;
    }

    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let outcome = handle_client_frame(
                            &state,
                            &mut joined,
                            conn_id,
                            user_id,
                            text.as_str(),
                        )
                        .await;
                        if let Some(reply) = outcome {
                            if send_frame(&mut sink, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // binary/ping/pong frames are ignored
                    Some(Err(e)) => {
                        tracing::debug!("[Gateway] Connection {} read error: {:?}", conn_id, e);
                        break;
                    }
                }
            }
            event = hub_rx.recv() => {
                match event {
                    Ok(event) => {
                        if session_wants(&joined, conn_id, &event)
                            && send_frame(&mut sink, &event.event).await.is_err()
                        {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "[Gateway] Connection {} lagged, skipped {} events",
                            conn_id,
                            skipped
                        );
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    finish_connection(&state, user_id, conn_id);
    tracing::debug!("[Gateway] Connection {} closed for user {}", conn_id, user_id);
}

/// Whether a hub event belongs on this connection
fn session_wants(joined: &HashSet<Uuid>, conn_id: Uuid, event: &RoomEvent) -> bool {
    if event.exclude_conn == Some(conn_id) {
        return false;
    }
    match event.scope {
        Scope::Chat(chat_id) => joined.contains(&chat_id),
        Scope::Global => true,
    }
}

/// Process one client frame. Returns a frame to send back on this
/// connection only (request-scoped errors), or `None`.
async fn handle_client_frame(
    state: &AppState,
    joined: &mut HashSet<Uuid>,
    conn_id: Uuid,
    user_id: Uuid,
    text: &str,
) -> Option<ServerEvent> {
    let realtime = &state.realtime;

    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!("[Gateway] Unparseable frame from {}: {:?}", conn_id, e);
            return Some(ServerEvent::Error {
                message: "unrecognized event".to_string(),
                chat_id: None,
            });
        }
    };

    match event {
        ClientEvent::JoinChat { chat_id } => {
            let pool = match &state.db_pool {
                Some(pool) => pool,
                None => {
                    return Some(error_event("service unavailable", chat_id));
                }
            };
            match join_room(pool, state, joined, conn_id, user_id, chat_id).await {
                Ok(None) => None,
                Ok(Some(error)) => Some(error),
                Err(e) => {
                    tracing::error!("[Gateway] Join authorization failed: {:?}", e);
                    Some(error_event("service unavailable", chat_id))
                }
            }
        }
        ClientEvent::LeaveChat { chat_id } => {
            // Leaving never re-authorizes
            realtime.rooms.leave(chat_id, conn_id);
            joined.remove(&chat_id);
            None
        }
        ClientEvent::Typing { chat_id } => {
            if joined.contains(&chat_id) {
                realtime.hub.broadcast(RoomEvent::chat_excluding(
                    chat_id,
                    conn_id,
                    ServerEvent::UserTyping { chat_id, user_id },
                ));
            }
            None
        }
        ClientEvent::StopTyping { chat_id } => {
            if joined.contains(&chat_id) {
                realtime.hub.broadcast(RoomEvent::chat_excluding(
                    chat_id,
                    conn_id,
                    ServerEvent::UserStopTyping { chat_id, user_id },
                ));
            }
            None
        }
        ClientEvent::SendMessage { chat_id, message } => {
            // Deprecated ephemeral echo: re-broadcasts a client-rendered
            // message body to the room without persisting it. The HTTP
            // POST is the durable send path.
            if !joined.contains(&chat_id) {
                return Some(error_event("not joined to this chat", chat_id));
            }
            match serde_json::from_value::<MessageView>(message) {
                Ok(view) if view.chat_id == chat_id => {
                    realtime.hub.broadcast(RoomEvent::chat_excluding(
                        chat_id,
                        conn_id,
                        ServerEvent::NewMessage(view),
                    ));
                    None
                }
                Ok(_) => Some(error_event("message does not belong to this chat", chat_id)),
                Err(_) => Some(error_event("malformed message payload", chat_id)),
            }
        }
    }
}

/// Authorize and perform a room join. `Ok(Some(_))` is a request-scoped
/// error frame for the client.
async fn join_room(
    pool: &PgPool,
    state: &AppState,
    joined: &mut HashSet<Uuid>,
    conn_id: Uuid,
    user_id: Uuid,
    chat_id: Uuid,
) -> Result<Option<ServerEvent>, sqlx::Error> {
    let realtime = &state.realtime;
    match authorize_join(pool, &realtime.membership_cache, chat_id, user_id).await? {
        JoinDecision::Granted => {
            realtime.rooms.join(chat_id, conn_id, user_id);
            joined.insert(chat_id);
            tracing::debug!("[Gateway] {} joined room {}", user_id, chat_id);
            Ok(None)
        }
        JoinDecision::UnknownChat => Ok(Some(error_event("chat not found", chat_id))),
        JoinDecision::NotMember => Ok(Some(error_event("not a member of this chat", chat_id))),
    }
}

fn error_event(message: &str, chat_id: Uuid) -> ServerEvent {
    ServerEvent::Error {
        message: message.to_string(),
        chat_id: Some(chat_id),
    }
}

/// Serialize and send one frame on this connection
async fn send_frame(
    sink: &mut (impl Sink<Message, Error = axum::Error> + Unpin),
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(event).map_err(axum::Error::new)?;
    sink.send(Message::Text(text.into())).await
}

/// Tear down all per-connection state, then decide whether the user went
/// offline. Runs on every exit path.
fn finish_connection(state: &AppState, user_id: Uuid, conn_id: Uuid) {
    let realtime = &state.realtime;
    realtime.rooms.leave_all(conn_id);
    if realtime.presence.disconnect(user_id, conn_id) {
        realtime.hub.broadcast(RoomEvent::global(ServerEvent::PresenceUpdate {
            user_id,
            status: PresenceStatus::Offline,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_wants_filters_by_room() {
        let conn = Uuid::new_v4();
        let chat = Uuid::new_v4();
        let mut joined = HashSet::new();

        let event = RoomEvent::chat(
            chat,
            ServerEvent::UserTyping {
                chat_id: chat,
                user_id: Uuid::new_v4(),
            },
        );
        assert!(!session_wants(&joined, conn, &event));

        joined.insert(chat);
        assert!(session_wants(&joined, conn, &event));
    }

    #[test]
    fn test_session_wants_global_events_always() {
        let joined = HashSet::new();
        let event = RoomEvent::global(ServerEvent::PresenceUpdate {
            user_id: Uuid::new_v4(),
            status: PresenceStatus::Online,
        });
        assert!(session_wants(&joined, Uuid::new_v4(), &event));
    }

    #[test]
    fn test_session_wants_excludes_originating_connection() {
        let conn = Uuid::new_v4();
        let chat = Uuid::new_v4();
        let mut joined = HashSet::new();
        joined.insert(chat);

        let event = RoomEvent::chat_excluding(
            chat,
            conn,
            ServerEvent::UserTyping {
                chat_id: chat,
                user_id: Uuid::new_v4(),
            },
        );
        assert!(!session_wants(&joined, conn, &event));
        assert!(session_wants(&joined, Uuid::new_v4(), &event));
    }
}
