//! Realtime Protocol Frames
//!
//! Defines the JSON frames exchanged over the WebSocket gateway and the
//! envelope used to route them through the in-process broadcast hub.
//!
//! Frames are tagged `{"event": ..., "data": ...}` in both directions. The
//! event names are the wire protocol; changing them breaks clients.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::message::{MessageView, ReactionGroup};

/// Presence status carried by `presence:update`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    /// User has at least one open connection
    Online,
    /// User's last connection closed
    Offline,
}

/// Frames sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A message was created in a joined chat
    NewMessage(MessageView),
    /// A message was edited
    MessageEdited(MessageView),
    /// A message was soft-deleted; carries only the id and timestamp,
    /// never the prior content
    MessageDeleted {
        chat_id: Uuid,
        message_id: Uuid,
        deleted_at: chrono::DateTime<chrono::Utc>,
    },
    /// Full current reaction set for a message (not a delta)
    ReactionUpdate {
        chat_id: Uuid,
        message_id: Uuid,
        reactions: Vec<ReactionGroup>,
    },
    /// A member observed a message for the first time
    MessageRead {
        chat_id: Uuid,
        message_id: Uuid,
        user_id: Uuid,
        read_at: chrono::DateTime<chrono::Utc>,
    },
    /// A message was pinned; carries the full hydrated message
    MessagePinned(MessageView),
    /// A message was unpinned
    MessageUnpinned { chat_id: Uuid, message_id: Uuid },
    /// A member started typing
    UserTyping { chat_id: Uuid, user_id: Uuid },
    /// A member stopped typing
    UserStopTyping { chat_id: Uuid, user_id: Uuid },
    /// A user's presence changed; fires once per 0<->N connection transition
    #[serde(rename = "presence:update")]
    PresenceUpdate { user_id: Uuid, status: PresenceStatus },
    /// One-time snapshot of all online users, sent to each new connection
    #[serde(rename = "presence:initial_state")]
    PresenceInitialState { online: Vec<Uuid> },
    /// A request-scoped failure; carries the offending chat id so the
    /// client can correlate. Never terminates the connection.
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        chat_id: Option<Uuid>,
    },
}

/// Frames sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Subscribe to a chat's room (membership re-validated server-side)
    JoinChat { chat_id: Uuid },
    /// Unsubscribe from a chat's room (unconditional)
    LeaveChat { chat_id: Uuid },
    /// Started typing in a chat
    Typing { chat_id: Uuid },
    /// Stopped typing in a chat
    StopTyping { chat_id: Uuid },
    /// Ephemeral echo of a client-rendered message body. Deprecated: this
    /// path does not persist; the HTTP POST is the durable send path.
    SendMessage {
        chat_id: Uuid,
        message: serde_json::Value,
    },
}

/// Where a hub event is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only connections joined to this chat's room
    Chat(Uuid),
    /// Every authenticated connection (presence updates)
    Global,
}

/// Envelope routed through the in-process broadcast hub.
///
/// Sessions filter by scope against their own joined-room set and drop
/// events originating from their own connection when `exclude_conn` is set
/// (typing indicators and the ephemeral echo go to *other* members only).
#[derive(Debug, Clone)]
pub struct RoomEvent {
    /// Delivery scope
    pub scope: Scope,
    /// Connection that caused the event and must not receive it
    pub exclude_conn: Option<Uuid>,
    /// The frame to deliver
    pub event: ServerEvent,
}

impl RoomEvent {
    /// Event for every member of a chat's room
    pub fn chat(chat_id: Uuid, event: ServerEvent) -> Self {
        Self {
            scope: Scope::Chat(chat_id),
            exclude_conn: None,
            event,
        }
    }

    /// Event for every member of a chat's room except the originating
    /// connection
    pub fn chat_excluding(chat_id: Uuid, conn_id: Uuid, event: ServerEvent) -> Self {
        Self {
            scope: Scope::Chat(chat_id),
            exclude_conn: Some(conn_id),
            event,
        }
    }

    /// Event for every connection
    pub fn global(event: ServerEvent) -> Self {
        Self {
            scope: Scope::Global,
            exclude_conn: None,
            event,
        }
    }
}
