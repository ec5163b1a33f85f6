//! Database operations for messages
//!
//! This module contains the persistence layer for messages and their
//! satellite rows: reactions, read receipts, and pins. Idempotent inserts
//! (same reaction, same receipt, same pin) rely on `ON CONFLICT DO
//! NOTHING` so retries and duplicates are absorbed at the store.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::shared::message::{
    MessageType, MessageView, ReactionGroup, ReplyPreview, SenderInfo,
};

/// A message row as stored, before hydration
#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub content: Option<String>,
    pub message_type: MessageType,
    pub metadata: Option<serde_json::Value>,
    pub reply_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

fn row_to_message(row: &sqlx::postgres::PgRow) -> Result<MessageRow, sqlx::Error> {
    let type_label: String = row.get("message_type");
    let message_type = MessageType::from_str(&type_label).ok_or_else(|| {
        sqlx::Error::Decode(format!("unknown message type '{type_label}'").into())
    })?;

    Ok(MessageRow {
        id: row.get("id"),
        chat_id: row.get("chat_id"),
        sender_id: row.get("sender_id"),
        content: row.get("content"),
        message_type,
        metadata: row.get("metadata"),
        reply_to: row.get("reply_to"),
        created_at: row.get("created_at"),
        edited_at: row.get("edited_at"),
        deleted_at: row.get("deleted_at"),
    })
}

/// Insert a new message
pub async fn insert_message(
    pool: &PgPool,
    chat_id: Uuid,
    sender_id: Uuid,
    content: Option<&str>,
    message_type: MessageType,
    metadata: Option<&serde_json::Value>,
    reply_to: Option<Uuid>,
) -> Result<MessageRow, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query(
        r#"
        INSERT INTO messages (id, chat_id, sender_id, content, message_type, metadata, reply_to, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, chat_id, sender_id, content, message_type, metadata, reply_to, created_at, edited_at, deleted_at
        "#
    )
    .bind(id)
    .bind(chat_id)
    .bind(sender_id)
    .bind(content)
    .bind(message_type.as_str())
    .bind(metadata)
    .bind(reply_to)
    .bind(now)
    .fetch_one(pool)
    .await?;

    row_to_message(&row)
}

/// Get a message by ID
pub async fn get_message(
    pool: &PgPool,
    message_id: Uuid,
) -> Result<Option<MessageRow>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, chat_id, sender_id, content, message_type, metadata, reply_to, created_at, edited_at, deleted_at
        FROM messages
        WHERE id = $1
        "#
    )
    .bind(message_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_message).transpose()
}

/// Replace a message's content and stamp the edit time
pub async fn update_message_content(
    pool: &PgPool,
    message_id: Uuid,
    content: &str,
) -> Result<MessageRow, sqlx::Error> {
    let now = Utc::now();

    let row = sqlx::query(
        r#"
        UPDATE messages
        SET content = $1, edited_at = $2
        WHERE id = $3
        RETURNING id, chat_id, sender_id, content, message_type, metadata, reply_to, created_at, edited_at, deleted_at
        "#
    )
    .bind(content)
    .bind(now)
    .bind(message_id)
    .fetch_one(pool)
    .await?;

    row_to_message(&row)
}

/// Soft-delete a message.
///
/// The delete time is set at most once; a repeat call returns the
/// original timestamp, making deletion idempotent from the caller's view.
pub async fn soft_delete_message(
    pool: &PgPool,
    message_id: Uuid,
) -> Result<DateTime<Utc>, sqlx::Error> {
    let now = Utc::now();

    let row = sqlx::query(
        r#"
        UPDATE messages
        SET deleted_at = COALESCE(deleted_at, $1)
        WHERE id = $2
        RETURNING deleted_at
        "#,
    )
    .bind(now)
    .bind(message_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get("deleted_at"))
}

/// Paginated message page for a chat, oldest first.
///
/// `before` is an exclusive cursor: only messages strictly older than the
/// cursor message are returned.
pub async fn list_messages(
    pool: &PgPool,
    chat_id: Uuid,
    limit: i64,
    before: Option<&MessageRow>,
) -> Result<Vec<MessageRow>, sqlx::Error> {
    let rows = match before {
        Some(cursor) => {
            sqlx::query(
                r#"
                SELECT id, chat_id, sender_id, content, message_type, metadata, reply_to, created_at, edited_at, deleted_at
                FROM messages
                WHERE chat_id = $1 AND (created_at, id) < ($2, $3)
                ORDER BY created_at DESC, id DESC
                LIMIT $4
                "#
            )
            .bind(chat_id)
            .bind(cursor.created_at)
            .bind(cursor.id)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                r#"
                SELECT id, chat_id, sender_id, content, message_type, metadata, reply_to, created_at, edited_at, deleted_at
                FROM messages
                WHERE chat_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT $2
                "#
            )
            .bind(chat_id)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };

    let mut messages = rows
        .iter()
        .map(row_to_message)
        .collect::<Result<Vec<_>, _>>()?;
    // Fetched newest-first for the LIMIT; callers want oldest -> newest
    messages.reverse();
    Ok(messages)
}

/// Add a reaction; duplicate (message, user, emoji) inserts are absorbed
pub async fn add_reaction(
    pool: &PgPool,
    message_id: Uuid,
    user_id: Uuid,
    emoji: &str,
) -> Result<(), sqlx::Error> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO reactions (message_id, user_id, emoji, created_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (message_id, user_id, emoji) DO NOTHING
        "#,
    )
    .bind(message_id)
    .bind(user_id)
    .bind(emoji)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove a reaction; removing one that does not exist is a no-op
pub async fn remove_reaction(
    pool: &PgPool,
    message_id: Uuid,
    user_id: Uuid,
    emoji: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        DELETE FROM reactions
        WHERE message_id = $1 AND user_id = $2 AND emoji = $3
        "#,
    )
    .bind(message_id)
    .bind(user_id)
    .bind(emoji)
    .execute(pool)
    .await?;

    Ok(())
}

/// The full current reaction set for a message, grouped by emoji in
/// first-reaction order
pub async fn reaction_groups(
    pool: &PgPool,
    message_id: Uuid,
) -> Result<Vec<ReactionGroup>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT emoji, user_id
        FROM reactions
        WHERE message_id = $1
        ORDER BY created_at ASC, user_id ASC
        "#,
    )
    .bind(message_id)
    .fetch_all(pool)
    .await?;

    let mut groups: Vec<ReactionGroup> = Vec::new();
    for row in rows {
        let emoji: String = row.get("emoji");
        let user_id: Uuid = row.get("user_id");
        match groups.iter_mut().find(|g| g.emoji == emoji) {
            Some(group) => group.user_ids.push(user_id),
            None => groups.push(ReactionGroup {
                emoji,
                user_ids: vec![user_id],
            }),
        }
    }

    Ok(groups)
}

/// Record the first time a user observed a message. Later observations of
/// the same message keep the original timestamp.
pub async fn insert_read_receipt(
    pool: &PgPool,
    message_id: Uuid,
    user_id: Uuid,
) -> Result<DateTime<Utc>, sqlx::Error> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO read_receipts (message_id, user_id, read_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (message_id, user_id) DO NOTHING
        "#,
    )
    .bind(message_id)
    .bind(user_id)
    .bind(now)
    .execute(pool)
    .await?;

    // First-read-wins: report the stored timestamp, not this call's
    let row = sqlx::query(
        r#"
        SELECT read_at
        FROM read_receipts
        WHERE message_id = $1 AND user_id = $2
        "#,
    )
    .bind(message_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get("read_at"))
}

/// Pin a message; pinning an already-pinned message is a no-op
pub async fn insert_pin(
    pool: &PgPool,
    message_id: Uuid,
    chat_id: Uuid,
    pinned_by: Uuid,
) -> Result<(), sqlx::Error> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO pinned_messages (message_id, chat_id, pinned_by, pinned_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (message_id) DO NOTHING
        "#,
    )
    .bind(message_id)
    .bind(chat_id)
    .bind(pinned_by)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Unpin a message; unpinning a message that is not pinned is a no-op
pub async fn remove_pin(pool: &PgPool, message_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        DELETE FROM pinned_messages
        WHERE message_id = $1
        "#,
    )
    .bind(message_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Whether a message is currently pinned
pub async fn is_pinned(pool: &PgPool, message_id: Uuid) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT 1 AS present
        FROM pinned_messages
        WHERE message_id = $1
        "#,
    )
    .bind(message_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// All pinned messages of a chat, in pin order
pub async fn list_pins(pool: &PgPool, chat_id: Uuid) -> Result<Vec<MessageRow>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT m.id, m.chat_id, m.sender_id, m.content, m.message_type, m.metadata, m.reply_to, m.created_at, m.edited_at, m.deleted_at
        FROM pinned_messages p
        INNER JOIN messages m ON m.id = p.message_id
        WHERE p.chat_id = $1
        ORDER BY p.pinned_at ASC
        "#
    )
    .bind(chat_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_message).collect()
}

/// Sender info for a hydrated message; `None` when the author was removed
async fn sender_info(
    pool: &PgPool,
    sender_id: Option<Uuid>,
) -> Result<Option<SenderInfo>, sqlx::Error> {
    let sender_id = match sender_id {
        Some(id) => id,
        None => return Ok(None),
    };

    let row = sqlx::query(
        r#"
        SELECT id, username, display_name, avatar_url
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(sender_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| SenderInfo {
        id: row.get("id"),
        username: row.get("username"),
        display_name: row.get("display_name"),
        avatar_url: row.get("avatar_url"),
    }))
}

/// Reply context for a hydrated message.
///
/// Uses the replied-to message's original content even when that message
/// has since been soft-deleted; the preview still renders.
async fn reply_preview(
    pool: &PgPool,
    reply_to: Option<Uuid>,
) -> Result<Option<ReplyPreview>, sqlx::Error> {
    let reply_to = match reply_to {
        Some(id) => id,
        None => return Ok(None),
    };

    let row = sqlx::query(
        r#"
        SELECT m.id, m.content, m.deleted_at, u.username, u.display_name
        FROM messages m
        LEFT JOIN users u ON u.id = m.sender_id
        WHERE m.id = $1
        "#,
    )
    .bind(reply_to)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| {
        let display_name: Option<String> = row.get("display_name");
        let username: Option<String> = row.get("username");
        let deleted_at: Option<DateTime<Utc>> = row.get("deleted_at");
        ReplyPreview {
            message_id: row.get("id"),
            content: row.get("content"),
            sender_name: display_name.or(username),
            deleted: deleted_at.is_some(),
        }
    }))
}

/// Assemble the full client-facing shape for one message row.
///
/// Soft-deleted messages hydrate without their content.
pub async fn hydrate(pool: &PgPool, row: MessageRow) -> Result<MessageView, sqlx::Error> {
    let sender = sender_info(pool, row.sender_id).await?;
    let reply_to = reply_preview(pool, row.reply_to).await?;
    let reactions = reaction_groups(pool, row.id).await?;
    let pinned = is_pinned(pool, row.id).await?;

    let content = if row.deleted_at.is_some() {
        None
    } else {
        row.content
    };

    Ok(MessageView {
        id: row.id,
        chat_id: row.chat_id,
        sender,
        content,
        message_type: row.message_type,
        metadata: row.metadata,
        reply_to,
        reactions,
        pinned,
        created_at: row.created_at,
        edited_at: row.edited_at,
        deleted_at: row.deleted_at,
    })
}
