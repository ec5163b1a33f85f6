//! Database operations for chats and rosters

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::shared::chat::{Chat, ChatKind};

fn row_to_chat(row: &sqlx::postgres::PgRow) -> Result<Chat, sqlx::Error> {
    let kind_label: String = row.get("kind");
    let community_id: Option<Uuid> = row.get("community_id");
    let id: Uuid = row.get("id");
    let kind = ChatKind::from_parts(&kind_label, community_id).ok_or_else(|| {
        sqlx::Error::Decode(
            format!("chat {id} has kind '{kind_label}' inconsistent with its community reference")
                .into(),
        )
    })?;

    Ok(Chat {
        id,
        name: row.get("name"),
        kind,
        created_at: row.get("created_at"),
    })
}

/// Find the direct chat shared by exactly these two users, if one exists
pub async fn find_direct_chat(
    pool: &PgPool,
    user_a: Uuid,
    user_b: Uuid,
) -> Result<Option<Chat>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT c.id, c.kind, c.name, c.community_id, c.created_at
        FROM chats c
        INNER JOIN chat_members ma ON ma.chat_id = c.id AND ma.user_id = $1
        INNER JOIN chat_members mb ON mb.chat_id = c.id AND mb.user_id = $2
        WHERE c.kind = 'direct'
        LIMIT 1
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_chat).transpose()
}

/// Create the direct chat between two users, or return the existing one.
///
/// Creation is transactional: the chat and both roster rows commit
/// together or not at all.
pub async fn ensure_direct_chat(
    pool: &PgPool,
    user_a: Uuid,
    user_b: Uuid,
) -> Result<Chat, sqlx::Error> {
    if let Some(existing) = find_direct_chat(pool, user_a, user_b).await? {
        return Ok(existing);
    }

    let id = Uuid::new_v4();
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO chats (id, kind, name, community_id, created_at)
        VALUES ($1, 'direct', NULL, NULL, $2)
        "#,
    )
    .bind(id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO chat_members (chat_id, user_id, joined_at)
        VALUES ($1, $2, $3), ($1, $4, $3)
        "#,
    )
    .bind(id)
    .bind(user_a)
    .bind(now)
    .bind(user_b)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Chat {
        id,
        name: None,
        kind: ChatKind::Direct,
        created_at: now,
    })
}

/// Create a group chat with the creator and the given members on the
/// roster
pub async fn create_group_chat(
    pool: &PgPool,
    creator_id: Uuid,
    name: &str,
    member_ids: &[Uuid],
) -> Result<Chat, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO chats (id, kind, name, community_id, created_at)
        VALUES ($1, 'group', $2, NULL, $3)
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO chat_members (chat_id, user_id, joined_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(id)
    .bind(creator_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    for member_id in member_ids {
        if *member_id == creator_id {
            continue;
        }
        sqlx::query(
            r#"
            INSERT INTO chat_members (chat_id, user_id, joined_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (chat_id, user_id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(member_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(Chat {
        id,
        name: Some(name.to_string()),
        kind: ChatKind::Group,
        created_at: now,
    })
}

/// Every chat visible to a user: roster chats plus all channels of the
/// communities they belong to
pub async fn list_chats_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Chat>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.kind, c.name, c.community_id, c.created_at
        FROM chats c
        INNER JOIN chat_members cm ON cm.chat_id = c.id
        WHERE cm.user_id = $1
        UNION
        SELECT c.id, c.kind, c.name, c.community_id, c.created_at
        FROM chats c
        INNER JOIN community_members cm ON cm.community_id = c.community_id
        WHERE cm.user_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_chat).collect()
}

/// A roster entry with the member's public profile fields
#[derive(Debug, Clone, serde::Serialize)]
pub struct MemberView {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    /// Per-chat nickname override; roster chats only
    pub nickname: Option<String>,
    pub joined_at: DateTime<Utc>,
}

/// Resolve a chat's roster with user profiles. Channels resolve through
/// the community roster and carry no per-chat nicknames.
pub async fn list_members(pool: &PgPool, chat: &Chat) -> Result<Vec<MemberView>, sqlx::Error> {
    let rows = match chat.kind {
        ChatKind::Channel { community_id } => {
            sqlx::query(
                r#"
                SELECT cm.user_id, u.username, u.display_name, u.avatar_url,
                       NULL AS nickname, cm.joined_at
                FROM community_members cm
                INNER JOIN users u ON u.id = cm.user_id
                WHERE cm.community_id = $1
                ORDER BY cm.joined_at ASC
                "#,
            )
            .bind(community_id)
            .fetch_all(pool)
            .await?
        }
        ChatKind::Direct | ChatKind::Group => {
            sqlx::query(
                r#"
                SELECT cm.user_id, u.username, u.display_name, u.avatar_url,
                       cm.nickname, cm.joined_at
                FROM chat_members cm
                INNER JOIN users u ON u.id = cm.user_id
                WHERE cm.chat_id = $1
                ORDER BY cm.joined_at ASC
                "#,
            )
            .bind(chat.id)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows
        .into_iter()
        .map(|row| MemberView {
            user_id: row.get("user_id"),
            username: row.get("username"),
            display_name: row.get("display_name"),
            avatar_url: row.get("avatar_url"),
            nickname: row.get("nickname"),
            joined_at: row.get("joined_at"),
        })
        .collect())
}

/// Set or clear the caller's nickname in a roster chat.
///
/// # Returns
///
/// `false` when the user has no roster row in this chat
pub async fn set_nickname(
    pool: &PgPool,
    chat_id: Uuid,
    user_id: Uuid,
    nickname: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE chat_members
        SET nickname = $1
        WHERE chat_id = $2 AND user_id = $3
        "#,
    )
    .bind(nickname)
    .bind(chat_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
