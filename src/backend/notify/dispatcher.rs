//! Push Fan-out Decisions
//!
//! Decides, per sent message, which chat members get a push notification:
//! everyone in the chat except the sender and anyone currently connected
//! to the chat's room. The computation runs on a spawned task after the
//! room broadcast; it never blocks or fails the send response.

use std::collections::HashSet;

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::backend::membership::member_user_ids;
use crate::backend::notify::push::PushClient;
use crate::backend::realtime::RealtimeState;
use crate::shared::chat::{Chat, ChatKind};
use crate::shared::message::{MessageType, MessageView};

/// Maximum characters of text content shown in a notification body
const PREVIEW_LEN: usize = 100;

/// Members who should receive a push: all members minus the sender and
/// minus anyone present in the room
pub fn compute_recipients(
    members: &[Uuid],
    sender_id: Uuid,
    present: &HashSet<Uuid>,
) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    members
        .iter()
        .copied()
        .filter(|id| *id != sender_id && !present.contains(id) && seen.insert(*id))
        .collect()
}

/// Notification title: the sender's name, with channel context appended
/// for channels and named groups
pub fn notification_title(sender_name: &str, chat: &Chat) -> String {
    match (&chat.kind, &chat.name) {
        (ChatKind::Channel { .. }, Some(name)) => format!("{sender_name} in {name}"),
        (ChatKind::Group, Some(name)) => format!("{sender_name} in {name}"),
        _ => sender_name.to_string(),
    }
}

/// Notification body: truncated text content, or a generic line for
/// non-text types
pub fn notification_body(content: Option<&str>, message_type: MessageType) -> String {
    match message_type {
        MessageType::Text => {
            let content = content.unwrap_or_default();
            if content.chars().count() > PREVIEW_LEN {
                let truncated: String = content.chars().take(PREVIEW_LEN).collect();
                format!("{truncated}…")
            } else {
                content.to_string()
            }
        }
        other => format!("Sent a {}", other.as_str()),
    }
}

/// Fan a just-sent message out to absent members.
///
/// Runs on its own task; the send response does not wait for it and its
/// failures are observability events only.
pub fn dispatch_message_push(
    pool: PgPool,
    realtime: RealtimeState,
    push: PushClient,
    chat: Chat,
    message: MessageView,
    sender_name: String,
) {
    tokio::spawn(async move {
        if let Err(e) = deliver(&pool, &realtime, &push, &chat, &message, &sender_name).await {
            tracing::warn!("[Push] Fan-out for message {} failed: {}", message.id, e);
        }
    });
}

async fn deliver(
    pool: &PgPool,
    realtime: &RealtimeState,
    push: &PushClient,
    chat: &Chat,
    message: &MessageView,
    sender_name: &str,
) -> Result<(), String> {
    let sender_id = message.sender.as_ref().map(|s| s.id).unwrap_or_default();

    let members = member_user_ids(pool, chat)
        .await
        .map_err(|e| format!("member lookup: {e}"))?;
    let present = realtime.rooms.users_in_room(chat.id);
    let recipients = compute_recipients(&members, sender_id, &present);

    if recipients.is_empty() {
        return Ok(());
    }

    let tokens = push_tokens(pool, &recipients)
        .await
        .map_err(|e| format!("token lookup: {e}"))?;
    if tokens.is_empty() {
        return Ok(());
    }

    let title = notification_title(sender_name, chat);
    let body = notification_body(message.content.as_deref(), message.message_type);
    let data = serde_json::json!({
        "chat_id": chat.id,
        "message_id": message.id,
    });

    push.send(&tokens, &title, &body, &data)
        .await
        .map_err(|e| format!("delivery: {e}"))?;

    tracing::debug!(
        "[Push] Message {} fanned out to {} recipients",
        message.id,
        recipients.len()
    );
    Ok(())
}

/// Registered device tokens for a set of users
async fn push_tokens(pool: &PgPool, user_ids: &[Uuid]) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT push_token
        FROM users
        WHERE id = ANY($1) AND push_token IS NOT NULL
        "#,
    )
    .bind(user_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| row.get::<String, _>("push_token"))
        .collect())
}
