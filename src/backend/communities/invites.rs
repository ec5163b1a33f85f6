//! Community Invites
//!
//! Invite creation and redemption. Redemption is the one multi-step
//! membership mutation that must be atomic: check the use count, insert
//! the membership, bump the count. The invite row is locked for the
//! duration of the transaction so two simultaneous redemptions of a
//! limited-use invite cannot both take the last slot.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::backend::error::ApiError;
use crate::shared::community::{Community, Invite};

fn row_to_invite(row: &sqlx::postgres::PgRow) -> Invite {
    Invite {
        code: row.get("code"),
        community_id: row.get("community_id"),
        created_by: row.get("created_by"),
        max_uses: row.get("max_uses"),
        uses: row.get("uses"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }
}

/// Generate a short shareable code
fn generate_code() -> String {
    let id = Uuid::new_v4();
    id.simple().to_string()[..10].to_string()
}

/// Create an invite for a community
pub async fn create_invite(
    pool: &PgPool,
    community_id: Uuid,
    created_by: Uuid,
    max_uses: Option<i32>,
    expires_at: Option<DateTime<Utc>>,
) -> Result<Invite, sqlx::Error> {
    let code = generate_code();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO invites (code, community_id, created_by, max_uses, uses, expires_at, created_at)
        VALUES ($1, $2, $3, $4, 0, $5, $6)
        "#,
    )
    .bind(&code)
    .bind(community_id)
    .bind(created_by)
    .bind(max_uses)
    .bind(expires_at)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Invite {
        code,
        community_id,
        created_by: Some(created_by),
        max_uses,
        uses: 0,
        expires_at,
        created_at: now,
    })
}

/// Redeem an invite, joining its community.
///
/// All-or-nothing: the use-count check, the membership insert, and the
/// count increment commit together. A user who is already a member
/// redeems successfully without consuming a use.
///
/// # Errors
///
/// * `NotFound` - unknown code
/// * `Expired` (410) - past expiry or max uses reached
pub async fn redeem_invite(
    pool: &PgPool,
    code: &str,
    user_id: Uuid,
) -> Result<Community, ApiError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        r#"
        SELECT code, community_id, created_by, max_uses, uses, expires_at, created_at
        FROM invites
        WHERE code = $1
        FOR UPDATE
        "#,
    )
    .bind(code)
    .fetch_optional(&mut *tx)
    .await?;

    let invite = match row {
        Some(row) => row_to_invite(&row),
        None => return Err(ApiError::NotFound("invite")),
    };

    let now = Utc::now();
    if let Some(expires_at) = invite.expires_at {
        if now >= expires_at {
            return Err(ApiError::Expired("invite has expired".to_string()));
        }
    }
    if let Some(max) = invite.max_uses {
        if invite.uses >= max {
            return Err(ApiError::Expired("invite max uses reached".to_string()));
        }
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO community_members (community_id, user_id, joined_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (community_id, user_id) DO NOTHING
        "#,
    )
    .bind(invite.community_id)
    .bind(user_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    // Only a genuinely new membership consumes a use
    if inserted.rows_affected() > 0 {
        sqlx::query(
            r#"
            UPDATE invites
            SET uses = uses + 1
            WHERE code = $1
            "#,
        )
        .bind(code)
        .execute(&mut *tx)
        .await?;
    }

    let row = sqlx::query(
        r#"
        SELECT id, name, owner_id, created_at
        FROM communities
        WHERE id = $1
        "#,
    )
    .bind(invite.community_id)
    .fetch_one(&mut *tx)
    .await?;

    let community = Community {
        id: row.get("id"),
        name: row.get("name"),
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
    };

    tx.commit().await?;
    Ok(community)
}
