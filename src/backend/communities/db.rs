//! Database operations for communities and channels

use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::shared::chat::{Chat, ChatKind};
use crate::shared::community::Community;

fn row_to_community(row: &sqlx::postgres::PgRow) -> Community {
    Community {
        id: row.get("id"),
        name: row.get("name"),
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
    }
}

/// Create a community.
///
/// The community row, the owner's roster row, and the default `general`
/// channel commit in one transaction: a community never exists without a
/// channel or without its owner on the roster.
pub async fn create_community(
    pool: &PgPool,
    name: &str,
    owner_id: Uuid,
) -> Result<(Community, Chat), sqlx::Error> {
    let community_id = Uuid::new_v4();
    let channel_id = Uuid::new_v4();
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO communities (id, name, owner_id, created_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(community_id)
    .bind(name)
    .bind(owner_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO community_members (community_id, user_id, joined_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(community_id)
    .bind(owner_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO chats (id, kind, name, community_id, created_at)
        VALUES ($1, 'channel', 'general', $2, $3)
        "#,
    )
    .bind(channel_id)
    .bind(community_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let community = Community {
        id: community_id,
        name: name.to_string(),
        owner_id,
        created_at: now,
    };
    let channel = Chat {
        id: channel_id,
        name: Some("general".to_string()),
        kind: ChatKind::Channel {
            community_id,
        },
        created_at: now,
    };

    Ok((community, channel))
}

/// Get a community by ID
pub async fn get_community(
    pool: &PgPool,
    community_id: Uuid,
) -> Result<Option<Community>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, name, owner_id, created_at
        FROM communities
        WHERE id = $1
        "#,
    )
    .bind(community_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(row_to_community))
}

/// Communities the user belongs to
pub async fn list_communities_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<Community>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.name, c.owner_id, c.created_at
        FROM communities c
        INNER JOIN community_members cm ON cm.community_id = c.id
        WHERE cm.user_id = $1
        ORDER BY c.created_at ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(row_to_community).collect())
}

/// Channels of a community, oldest first
pub async fn list_channels(pool: &PgPool, community_id: Uuid) -> Result<Vec<Chat>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, created_at
        FROM chats
        WHERE community_id = $1 AND kind = 'channel'
        ORDER BY created_at ASC
        "#,
    )
    .bind(community_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Chat {
            id: row.get("id"),
            name: row.get("name"),
            kind: ChatKind::Channel { community_id },
            created_at: row.get("created_at"),
        })
        .collect())
}

/// Create a channel in a community
pub async fn create_channel(
    pool: &PgPool,
    community_id: Uuid,
    name: &str,
) -> Result<Chat, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO chats (id, kind, name, community_id, created_at)
        VALUES ($1, 'channel', $2, $3, $4)
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(community_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Chat {
        id,
        name: Some(name.to_string()),
        kind: ChatKind::Channel { community_id },
        created_at: now,
    })
}

/// Rename a channel
pub async fn rename_channel(pool: &PgPool, chat_id: Uuid, name: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE chats
        SET name = $1
        WHERE id = $2 AND kind = 'channel'
        "#,
    )
    .bind(name)
    .bind(chat_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a channel, refusing to delete the community's last one.
///
/// The count check and the delete run in one transaction so two
/// concurrent deletes cannot leave the community without channels.
pub async fn delete_channel(
    pool: &PgPool,
    community_id: Uuid,
    chat_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    // Lock the community's channel rows so two concurrent deletes cannot
    // both see count > 1
    let channels = sqlx::query(
        r#"
        SELECT id
        FROM chats
        WHERE community_id = $1 AND kind = 'channel'
        FOR UPDATE
        "#,
    )
    .bind(community_id)
    .fetch_all(&mut *tx)
    .await?;

    if channels.len() <= 1 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query(
        r#"
        DELETE FROM chats
        WHERE id = $1 AND community_id = $2
        "#,
    )
    .bind(chat_id)
    .bind(community_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}

/// Add a member to the community roster; rejoining is a no-op
pub async fn add_member(
    pool: &PgPool,
    community_id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO community_members (community_id, user_id, joined_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (community_id, user_id) DO NOTHING
        "#,
    )
    .bind(community_id)
    .bind(user_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove a member from the community roster
pub async fn remove_member(
    pool: &PgPool,
    community_id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        DELETE FROM community_members
        WHERE community_id = $1 AND user_id = $2
        "#,
    )
    .bind(community_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Transfer ownership to another member
pub async fn transfer_ownership(
    pool: &PgPool,
    community_id: Uuid,
    new_owner_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE communities
        SET owner_id = $1
        WHERE id = $2
        "#,
    )
    .bind(new_owner_id)
    .bind(community_id)
    .execute(pool)
    .await?;

    Ok(())
}
