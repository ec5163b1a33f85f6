//! Message Lifecycle Engine
//!
//! Owns the state transitions of a message and its satellite rows. Every
//! operation authorizes through the membership check first; message-scoped
//! operations resolve the owning chat from the message, then check that
//! chat. A missing message or chat is `NotFound`; a failed membership or
//! authorship check is `Forbidden`; the two are never conflated.
//!
//! State machine per message: created -> edited* -> soft-deleted. Deletion
//! is terminal; a deleted message rejects edits forever, and deleting it
//! again is a no-op success. Reactions, read receipts, and pins are
//! idempotent by design.
//!
//! Broadcasts fire only after the durable write they report has committed,
//! so room members never observe an event for data a reconnecting client
//! could not query.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::auth::users::get_user_by_id;
use crate::backend::error::ApiError;
use crate::backend::membership::{check_chat_access, ChatAccess};
use crate::backend::messages::db;
use crate::backend::messages::db::MessageRow;
use crate::backend::messages::sanitize::{sanitize_text, strip_html};
use crate::backend::notify::{dispatch_message_push, PushClient};
use crate::backend::realtime::RealtimeState;
use crate::shared::chat::Chat;
use crate::shared::event::{RoomEvent, ServerEvent};
use crate::shared::message::{MessageType, MessageView, ReactionGroup};

/// Default page size for message listing
const DEFAULT_PAGE_SIZE: i64 = 50;
/// Largest allowed page size
const MAX_PAGE_SIZE: i64 = 100;

/// Send request body (POST /messages/{chat_id})
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Text content; required for `text`, optional caption otherwise
    pub content: Option<String>,
    /// Content type; defaults to `text`
    #[serde(default)]
    pub message_type: MessageType,
    /// Structured metadata blob
    pub metadata: Option<serde_json::Value>,
    /// Message this one replies to
    pub reply_to: Option<Uuid>,
}

/// Clamp a client-supplied page size into 1..=100, defaulting to 50
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Membership gate for chat-scoped operations
async fn require_member(pool: &PgPool, chat_id: Uuid, user_id: Uuid) -> Result<Chat, ApiError> {
    match check_chat_access(pool, chat_id, user_id).await? {
        ChatAccess::Member(chat) => Ok(chat),
        ChatAccess::NotFound => Err(ApiError::NotFound("chat")),
        ChatAccess::NotMember => Err(ApiError::forbidden("not a member of this chat")),
    }
}

/// Membership gate for message-scoped operations: the message is looked up
/// first, then its owning chat's membership is checked
async fn require_message_access(
    pool: &PgPool,
    message_id: Uuid,
    user_id: Uuid,
) -> Result<(MessageRow, Chat), ApiError> {
    let message = db::get_message(pool, message_id)
        .await?
        .ok_or(ApiError::NotFound("message"))?;
    let chat = require_member(pool, message.chat_id, user_id).await?;
    Ok((message, chat))
}

/// Validate and normalize content for a send
fn prepare_content(
    content: Option<&str>,
    message_type: MessageType,
) -> Result<Option<String>, ApiError> {
    match message_type {
        MessageType::Text => {
            let raw = content.ok_or_else(|| ApiError::invalid("message content cannot be empty"))?;
            Ok(Some(sanitize_text(raw)?))
        }
        // Non-text captions are optional; markup is still stripped
        _ => Ok(content.map(strip_html).filter(|c| !c.is_empty())),
    }
}

/// Send a message to a chat.
///
/// The sender identity comes from the authenticated request, never the
/// payload. On success the hydrated message is broadcast to the chat's
/// room and push fan-out to absent members is queued fire-and-forget.
pub async fn send_message(
    pool: &PgPool,
    realtime: &RealtimeState,
    push: &PushClient,
    chat_id: Uuid,
    sender_id: Uuid,
    request: SendMessageRequest,
) -> Result<MessageView, ApiError> {
    let chat = require_member(pool, chat_id, sender_id).await?;

    let content = prepare_content(request.content.as_deref(), request.message_type)?;

    if let Some(reply_to) = request.reply_to {
        let target = db::get_message(pool, reply_to)
            .await?
            .ok_or(ApiError::NotFound("message"))?;
        if target.chat_id != chat_id {
            return Err(ApiError::invalid("reply target belongs to another chat"));
        }
    }

    let row = db::insert_message(
        pool,
        chat_id,
        sender_id,
        content.as_deref(),
        request.message_type,
        request.metadata.as_ref(),
        request.reply_to,
    )
    .await?;
    let view = db::hydrate(pool, row).await?;

    realtime
        .hub
        .broadcast(RoomEvent::chat(chat_id, ServerEvent::NewMessage(view.clone())));

    // Push fan-out is queued after the broadcast and never blocks the
    // response; its failures are logged only.
    let sender_name = get_user_by_id(pool, sender_id)
        .await?
        .map(|u| u.visible_name().to_string())
        .unwrap_or_else(|| "Someone".to_string());
    dispatch_message_push(
        pool.clone(),
        realtime.clone(),
        push.clone(),
        chat,
        view.clone(),
        sender_name,
    );

    Ok(view)
}

/// Edit a message's content. Author-only; rejected once the message is
/// deleted.
pub async fn edit_message(
    pool: &PgPool,
    realtime: &RealtimeState,
    message_id: Uuid,
    editor_id: Uuid,
    new_content: &str,
) -> Result<MessageView, ApiError> {
    let (message, _chat) = require_message_access(pool, message_id, editor_id).await?;

    if message.sender_id != Some(editor_id) {
        return Err(ApiError::forbidden("only the author can edit a message"));
    }
    if message.deleted_at.is_some() {
        return Err(ApiError::invalid("cannot edit a deleted message"));
    }

    let content = sanitize_text(new_content)?;
    let row = db::update_message_content(pool, message_id, &content).await?;
    let view = db::hydrate(pool, row).await?;

    realtime.hub.broadcast(RoomEvent::chat(
        view.chat_id,
        ServerEvent::MessageEdited(view.clone()),
    ));

    Ok(view)
}

/// Soft-delete a message. Author-only and terminal; deleting an
/// already-deleted message succeeds without effect. The broadcast carries
/// only the id and timestamp, never the prior content.
pub async fn delete_message(
    pool: &PgPool,
    realtime: &RealtimeState,
    message_id: Uuid,
    user_id: Uuid,
) -> Result<DateTime<Utc>, ApiError> {
    let (message, _chat) = require_message_access(pool, message_id, user_id).await?;

    if message.sender_id != Some(user_id) {
        return Err(ApiError::forbidden("only the author can delete a message"));
    }

    let already_deleted = message.deleted_at.is_some();
    let deleted_at = db::soft_delete_message(pool, message_id).await?;

    if !already_deleted {
        realtime.hub.broadcast(RoomEvent::chat(
            message.chat_id,
            ServerEvent::MessageDeleted {
                chat_id: message.chat_id,
                message_id,
                deleted_at,
            },
        ));
    }

    Ok(deleted_at)
}

/// Add a reaction. Open to any member; duplicates are no-op successes.
/// The broadcast carries the full recomputed reaction set, not a delta.
pub async fn add_reaction(
    pool: &PgPool,
    realtime: &RealtimeState,
    message_id: Uuid,
    user_id: Uuid,
    emoji: &str,
) -> Result<Vec<ReactionGroup>, ApiError> {
    if emoji.trim().is_empty() {
        return Err(ApiError::invalid("missing emoji"));
    }
    let (message, _chat) = require_message_access(pool, message_id, user_id).await?;

    db::add_reaction(pool, message_id, user_id, emoji.trim()).await?;
    let reactions = db::reaction_groups(pool, message_id).await?;

    realtime.hub.broadcast(RoomEvent::chat(
        message.chat_id,
        ServerEvent::ReactionUpdate {
            chat_id: message.chat_id,
            message_id,
            reactions: reactions.clone(),
        },
    ));

    Ok(reactions)
}

/// Remove a reaction. Removing one that does not exist is a no-op
/// success; the full set is still recomputed and broadcast.
pub async fn remove_reaction(
    pool: &PgPool,
    realtime: &RealtimeState,
    message_id: Uuid,
    user_id: Uuid,
    emoji: &str,
) -> Result<Vec<ReactionGroup>, ApiError> {
    let (message, _chat) = require_message_access(pool, message_id, user_id).await?;

    db::remove_reaction(pool, message_id, user_id, emoji).await?;
    let reactions = db::reaction_groups(pool, message_id).await?;

    realtime.hub.broadcast(RoomEvent::chat(
        message.chat_id,
        ServerEvent::ReactionUpdate {
            chat_id: message.chat_id,
            message_id,
            reactions: reactions.clone(),
        },
    ));

    Ok(reactions)
}

/// Record that a member observed a message. First read wins; repeats keep
/// the original timestamp.
pub async fn mark_read(
    pool: &PgPool,
    realtime: &RealtimeState,
    message_id: Uuid,
    user_id: Uuid,
) -> Result<DateTime<Utc>, ApiError> {
    let (message, _chat) = require_message_access(pool, message_id, user_id).await?;

    let read_at = db::insert_read_receipt(pool, message_id, user_id).await?;

    realtime.hub.broadcast(RoomEvent::chat(
        message.chat_id,
        ServerEvent::MessageRead {
            chat_id: message.chat_id,
            message_id,
            user_id,
            read_at,
        },
    ));

    Ok(read_at)
}

/// Pin a message. Open to any member; pinning an already-pinned message
/// reports success without a second pin. Broadcasts the full hydrated
/// message with its pin state.
pub async fn pin_message(
    pool: &PgPool,
    realtime: &RealtimeState,
    message_id: Uuid,
    user_id: Uuid,
) -> Result<MessageView, ApiError> {
    let (message, _chat) = require_message_access(pool, message_id, user_id).await?;

    db::insert_pin(pool, message_id, message.chat_id, user_id).await?;
    let view = db::hydrate(pool, message).await?;

    realtime.hub.broadcast(RoomEvent::chat(
        view.chat_id,
        ServerEvent::MessagePinned(view.clone()),
    ));

    Ok(view)
}

/// Unpin a message. Open to any member; idempotent. Broadcasts only the
/// (chat, message) pair.
pub async fn unpin_message(
    pool: &PgPool,
    realtime: &RealtimeState,
    message_id: Uuid,
    user_id: Uuid,
) -> Result<(), ApiError> {
    let (message, _chat) = require_message_access(pool, message_id, user_id).await?;

    db::remove_pin(pool, message_id).await?;

    realtime.hub.broadcast(RoomEvent::chat(
        message.chat_id,
        ServerEvent::MessageUnpinned {
            chat_id: message.chat_id,
            message_id,
        },
    ));

    Ok(())
}

/// Paginated message history for a chat, oldest to newest
pub async fn list_messages(
    pool: &PgPool,
    chat_id: Uuid,
    user_id: Uuid,
    limit: Option<i64>,
    before: Option<Uuid>,
) -> Result<Vec<MessageView>, ApiError> {
    require_member(pool, chat_id, user_id).await?;

    let cursor = match before {
        Some(before_id) => {
            let cursor = db::get_message(pool, before_id)
                .await?
                .ok_or(ApiError::NotFound("message"))?;
            if cursor.chat_id != chat_id {
                return Err(ApiError::invalid("cursor belongs to another chat"));
            }
            Some(cursor)
        }
        None => None,
    };

    let rows = db::list_messages(pool, chat_id, clamp_limit(limit), cursor.as_ref()).await?;

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(db::hydrate(pool, row).await?);
    }
    Ok(views)
}

/// All pinned messages of a chat
pub async fn list_pins(
    pool: &PgPool,
    chat_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<MessageView>, ApiError> {
    require_member(pool, chat_id, user_id).await?;

    let rows = db::list_pins(pool, chat_id).await?;
    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(db::hydrate(pool, row).await?);
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 50);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-3)), 1);
        assert_eq!(clamp_limit(Some(70)), 70);
        assert_eq!(clamp_limit(Some(1000)), 100);
    }

    #[test]
    fn test_prepare_content_requires_text() {
        assert!(prepare_content(None, MessageType::Text).is_err());
        assert!(prepare_content(Some("<p></p>"), MessageType::Text).is_err());
        assert_eq!(
            prepare_content(Some("hi"), MessageType::Text).unwrap(),
            Some("hi".to_string())
        );
    }

    #[test]
    fn test_prepare_content_optional_for_attachments() {
        assert_eq!(prepare_content(None, MessageType::Image).unwrap(), None);
        assert_eq!(
            prepare_content(Some("caption"), MessageType::Image).unwrap(),
            Some("caption".to_string())
        );
        // A markup-only caption collapses to no caption rather than an error
        assert_eq!(
            prepare_content(Some("<b></b>"), MessageType::Gif).unwrap(),
            None
        );
    }
}
