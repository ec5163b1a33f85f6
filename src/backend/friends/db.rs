//! Database operations for friend relationships

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Status of a friend request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendRequestStatus::Pending => "pending",
            FriendRequestStatus::Accepted => "accepted",
            FriendRequestStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(FriendRequestStatus::Pending),
            "accepted" => Some(FriendRequestStatus::Accepted),
            "rejected" => Some(FriendRequestStatus::Rejected),
            _ => None,
        }
    }
}

/// A friend request row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequest {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

fn row_to_request(row: &sqlx::postgres::PgRow) -> Result<FriendRequest, sqlx::Error> {
    let status_label: String = row.get("status");
    let status = FriendRequestStatus::from_str(&status_label).ok_or_else(|| {
        sqlx::Error::Decode(format!("unknown friend request status '{status_label}'").into())
    })?;

    Ok(FriendRequest {
        id: row.get("id"),
        from_user_id: row.get("from_user_id"),
        to_user_id: row.get("to_user_id"),
        status,
        created_at: row.get("created_at"),
        responded_at: row.get("responded_at"),
    })
}

/// Create a new friend request
pub async fn create_friend_request(
    pool: &PgPool,
    from_user_id: Uuid,
    to_user_id: Uuid,
) -> Result<FriendRequest, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO friend_requests (id, from_user_id, to_user_id, status, created_at, responded_at)
        VALUES ($1, $2, $3, 'pending', $4, NULL)
        "#,
    )
    .bind(id)
    .bind(from_user_id)
    .bind(to_user_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(FriendRequest {
        id,
        from_user_id,
        to_user_id,
        status: FriendRequestStatus::Pending,
        created_at: now,
        responded_at: None,
    })
}

/// Get pending friend requests addressed to a user
pub async fn get_pending_friend_requests(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<FriendRequest>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, from_user_id, to_user_id, status, created_at, responded_at
        FROM friend_requests
        WHERE to_user_id = $1 AND status = 'pending'
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_request).collect()
}

/// Get a friend request by ID
pub async fn get_friend_request_by_id(
    pool: &PgPool,
    request_id: Uuid,
) -> Result<Option<FriendRequest>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, from_user_id, to_user_id, status, created_at, responded_at
        FROM friend_requests
        WHERE id = $1
        "#,
    )
    .bind(request_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_request).transpose()
}

/// Any request (in either direction) between two users
pub async fn find_request_between(
    pool: &PgPool,
    user_a: Uuid,
    user_b: Uuid,
) -> Result<Option<FriendRequest>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, from_user_id, to_user_id, status, created_at, responded_at
        FROM friend_requests
        WHERE (from_user_id = $1 AND to_user_id = $2)
           OR (from_user_id = $2 AND to_user_id = $1)
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_request).transpose()
}

/// Record the recipient's decision
pub async fn set_request_status(
    pool: &PgPool,
    request_id: Uuid,
    status: FriendRequestStatus,
) -> Result<(), sqlx::Error> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE friend_requests
        SET status = $1, responded_at = $2
        WHERE id = $3
        "#,
    )
    .bind(status.as_str())
    .bind(now)
    .bind(request_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// A friend with their public profile fields
#[derive(Debug, Clone, Serialize)]
pub struct FriendView {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub friends_since: DateTime<Utc>,
}

/// Accepted friendships of a user, in either request direction
pub async fn list_friends(pool: &PgPool, user_id: Uuid) -> Result<Vec<FriendView>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT u.id AS user_id, u.username, u.display_name, u.avatar_url,
               fr.responded_at AS friends_since
        FROM friend_requests fr
        INNER JOIN users u
            ON u.id = CASE WHEN fr.from_user_id = $1 THEN fr.to_user_id ELSE fr.from_user_id END
        WHERE fr.status = 'accepted'
          AND (fr.from_user_id = $1 OR fr.to_user_id = $1)
        ORDER BY u.username ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| FriendView {
            user_id: row.get("user_id"),
            username: row.get("username"),
            display_name: row.get("display_name"),
            avatar_url: row.get("avatar_url"),
            friends_since: row
                .get::<Option<DateTime<Utc>>, _>("friends_since")
                .unwrap_or_else(Utc::now),
        })
        .collect())
}
