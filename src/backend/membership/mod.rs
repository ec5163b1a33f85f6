//! Membership Decisions
//!
//! This module answers the one question every chat operation asks first:
//! may this user act on this chat? Direct and group chats are checked
//! against their own roster; channels are checked against the parent
//! community's roster. The decision is pure data with no side effects, so
//! callers can map outcomes to HTTP or socket errors deterministically.
//!
//! The realtime gateway performs this check on every room join; the
//! [`cache::MembershipCache`] bounds its cost with a short positive-only
//! TTL (membership revocations become visible within the TTL window).

pub mod cache;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::shared::chat::{Chat, ChatKind};
use cache::MembershipCache;

/// Outcome of a membership check.
///
/// `NotFound` and `NotMember` are data, not errors: the HTTP layer maps
/// them to 404 and 403, the gateway to request-scoped error events.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatAccess {
    /// The chat does not exist
    NotFound,
    /// The chat exists but the user is not a member
    NotMember,
    /// The user may act on this chat
    Member(Chat),
}

impl ChatAccess {
    /// Whether the check passed
    pub fn is_member(&self) -> bool {
        matches!(self, ChatAccess::Member(_))
    }
}

/// Decision for a realtime room-join request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinDecision {
    /// Connection may join the room
    Granted,
    /// No such chat
    UnknownChat,
    /// Chat exists, user is not a member
    NotMember,
}

/// Load a chat by id, enforcing the kind/community invariant at the
/// decode boundary
pub async fn load_chat(pool: &PgPool, chat_id: Uuid) -> Result<Option<Chat>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, kind, name, community_id, created_at
        FROM chats
        WHERE id = $1
        "#,
    )
    .bind(chat_id)
    .fetch_optional(pool)
    .await?;

    row.map(|row| {
        let kind_label: String = row.get("kind");
        let community_id: Option<Uuid> = row.get("community_id");
        let kind = ChatKind::from_parts(&kind_label, community_id).ok_or_else(|| {
            sqlx::Error::Decode(
                format!("chat {chat_id} has kind '{kind_label}' inconsistent with its community reference")
                    .into(),
            )
        })?;
        let created_at: DateTime<Utc> = row.get("created_at");
        Ok(Chat {
            id: row.get("id"),
            name: row.get("name"),
            kind,
            created_at,
        })
    })
    .transpose()
}

/// Check whether `user_id` may act on `chat_id`.
///
/// Resolves the chat's kind first: a channel delegates to the community
/// roster, everything else to the chat's own roster. Cheap enough to run
/// on every message operation; this is the authorization gate for all of
/// them.
pub async fn check_chat_access(
    pool: &PgPool,
    chat_id: Uuid,
    user_id: Uuid,
) -> Result<ChatAccess, sqlx::Error> {
    let chat = match load_chat(pool, chat_id).await? {
        Some(chat) => chat,
        None => return Ok(ChatAccess::NotFound),
    };

    let is_member = match chat.kind {
        ChatKind::Channel { community_id } => {
            is_community_member(pool, community_id, user_id).await?
        }
        ChatKind::Direct | ChatKind::Group => is_chat_member(pool, chat_id, user_id).await?,
    };

    if is_member {
        Ok(ChatAccess::Member(chat))
    } else {
        Ok(ChatAccess::NotMember)
    }
}

/// Room-join authorization for the realtime gateway.
///
/// Consults the TTL cache before touching the store; only positive
/// decisions are cached, so a denial is always re-checked.
pub async fn authorize_join(
    pool: &PgPool,
    cache: &MembershipCache,
    chat_id: Uuid,
    user_id: Uuid,
) -> Result<JoinDecision, sqlx::Error> {
    if cache.check(user_id, chat_id) {
        return Ok(JoinDecision::Granted);
    }

    match check_chat_access(pool, chat_id, user_id).await? {
        ChatAccess::Member(_) => {
            cache.insert(user_id, chat_id);
            Ok(JoinDecision::Granted)
        }
        ChatAccess::NotFound => Ok(JoinDecision::UnknownChat),
        ChatAccess::NotMember => Ok(JoinDecision::NotMember),
    }
}

/// Membership row test against a direct/group roster
pub async fn is_chat_member(
    pool: &PgPool,
    chat_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT 1 AS present
        FROM chat_members
        WHERE chat_id = $1 AND user_id = $2
        "#,
    )
    .bind(chat_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Membership row test against a community roster
pub async fn is_community_member(
    pool: &PgPool,
    community_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT 1 AS present
        FROM community_members
        WHERE community_id = $1 AND user_id = $2
        "#,
    )
    .bind(community_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// All member user ids of a chat, resolved through the correct roster.
///
/// Used by the push dispatcher to compute fan-out recipients.
pub async fn member_user_ids(pool: &PgPool, chat: &Chat) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows = match chat.kind {
        ChatKind::Channel { community_id } => {
            sqlx::query(
                r#"
                SELECT user_id
                FROM community_members
                WHERE community_id = $1
                "#,
            )
            .bind(community_id)
            .fetch_all(pool)
            .await?
        }
        ChatKind::Direct | ChatKind::Group => {
            sqlx::query(
                r#"
                SELECT user_id
                FROM chat_members
                WHERE chat_id = $1
                "#,
            )
            .bind(chat.id)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().map(|row| row.get("user_id")).collect())
}
