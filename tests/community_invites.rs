//! Community and invite integration tests
//!
//! Community creation invariants, ownership rules, and the transactional
//! invite redemption path.
//!
//! These tests need a PostgreSQL instance (DATABASE_URL) and are ignored
//! by default; run them with `cargo test -- --ignored`.

mod common;

use serial_test::serial;

use common::auth_helpers::create_unique_test_user;
use common::database::TestDatabase;

use ripple::backend::communities::{db as communities, invites};
use ripple::backend::error::ApiError;
use ripple::backend::membership::is_community_member;
use ripple::shared::chat::ChatKind;

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_community_created_with_default_channel_and_owner() {
    let db = TestDatabase::new().await;
    let pool = db.pool();

    let owner = create_unique_test_user(pool).await.unwrap();
    let (community, default_channel) = communities::create_community(pool, "lounge", owner.id)
        .await
        .unwrap();

    assert_eq!(community.owner_id, owner.id);
    assert!(matches!(default_channel.kind, ChatKind::Channel { community_id } if community_id == community.id));
    assert_eq!(default_channel.name.as_deref(), Some("general"));

    // Owner is on the roster from the same transaction
    assert!(is_community_member(pool, community.id, owner.id)
        .await
        .unwrap());

    let channels = communities::list_channels(pool, community.id).await.unwrap();
    assert_eq!(channels.len(), 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_last_channel_cannot_be_deleted() {
    let db = TestDatabase::new().await;
    let pool = db.pool();

    let owner = create_unique_test_user(pool).await.unwrap();
    let (community, default_channel) = communities::create_community(pool, "solo", owner.id)
        .await
        .unwrap();

    let deleted = communities::delete_channel(pool, community.id, default_channel.id)
        .await
        .unwrap();
    assert!(!deleted);

    // With a second channel the first may go
    let extra = communities::create_channel(pool, community.id, "offtopic")
        .await
        .unwrap();
    let deleted = communities::delete_channel(pool, community.id, extra.id)
        .await
        .unwrap();
    assert!(deleted);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_invite_exhaustion() {
    let db = TestDatabase::new().await;
    let pool = db.pool();

    let owner = create_unique_test_user(pool).await.unwrap();
    let x = create_unique_test_user(pool).await.unwrap();
    let y = create_unique_test_user(pool).await.unwrap();

    let (community, _) = communities::create_community(pool, "exclusive", owner.id)
        .await
        .unwrap();
    let invite = invites::create_invite(pool, community.id, owner.id, Some(1), None)
        .await
        .unwrap();

    // First redemption takes the only slot
    let joined = invites::redeem_invite(pool, &invite.code, x.id).await.unwrap();
    assert_eq!(joined.id, community.id);
    assert!(is_community_member(pool, community.id, x.id).await.unwrap());

    // Second redemption fails 410 and creates no membership
    let result = invites::redeem_invite(pool, &invite.code, y.id).await;
    assert!(matches!(result, Err(ApiError::Expired(_))));
    assert!(!is_community_member(pool, community.id, y.id).await.unwrap());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_redeeming_as_existing_member_consumes_no_use() {
    let db = TestDatabase::new().await;
    let pool = db.pool();

    let owner = create_unique_test_user(pool).await.unwrap();
    let x = create_unique_test_user(pool).await.unwrap();

    let (community, _) = communities::create_community(pool, "club", owner.id)
        .await
        .unwrap();
    let invite = invites::create_invite(pool, community.id, owner.id, Some(1), None)
        .await
        .unwrap();

    // The owner is already a member: redemption succeeds without
    // consuming the single slot
    invites::redeem_invite(pool, &invite.code, owner.id)
        .await
        .unwrap();
    invites::redeem_invite(pool, &invite.code, x.id).await.unwrap();
    assert!(is_community_member(pool, community.id, x.id).await.unwrap());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_expired_invite_is_gone() {
    let db = TestDatabase::new().await;
    let pool = db.pool();

    let owner = create_unique_test_user(pool).await.unwrap();
    let x = create_unique_test_user(pool).await.unwrap();

    let (community, _) = communities::create_community(pool, "late", owner.id)
        .await
        .unwrap();
    let expired_at = chrono::Utc::now() - chrono::Duration::hours(1);
    let invite = invites::create_invite(pool, community.id, owner.id, None, Some(expired_at))
        .await
        .unwrap();

    let result = invites::redeem_invite(pool, &invite.code, x.id).await;
    assert!(matches!(result, Err(ApiError::Expired(_))));
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_ownership_transfer() {
    let db = TestDatabase::new().await;
    let pool = db.pool();

    let owner = create_unique_test_user(pool).await.unwrap();
    let heir = create_unique_test_user(pool).await.unwrap();

    let (community, _) = communities::create_community(pool, "dynasty", owner.id)
        .await
        .unwrap();
    communities::add_member(pool, community.id, heir.id)
        .await
        .unwrap();

    communities::transfer_ownership(pool, community.id, heir.id)
        .await
        .unwrap();

    let community = communities::get_community(pool, community.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(community.owner_id, heir.id);
}
