//! Message lifecycle integration tests
//!
//! Exercises the lifecycle engine against a real database: send, edit,
//! soft-delete, reactions, read receipts, pins, pagination, and the
//! broadcasts each operation produces.
//!
//! These tests need a PostgreSQL instance (DATABASE_URL) and are ignored
//! by default; run them with `cargo test -- --ignored`.

mod common;

use serial_test::serial;
use uuid::Uuid;

use common::auth_helpers::create_unique_test_user;
use common::database::TestDatabase;
use common::test_state;

use ripple::backend::chats::db::ensure_direct_chat;
use ripple::backend::error::ApiError;
use ripple::backend::membership::member_user_ids;
use ripple::backend::messages::engine::{self, SendMessageRequest};
use ripple::backend::messages::db::get_message;
use ripple::backend::notify::dispatcher::compute_recipients;
use ripple::shared::event::ServerEvent;
use ripple::shared::message::MessageType;

fn text_message(content: &str) -> SendMessageRequest {
    SendMessageRequest {
        content: Some(content.to_string()),
        message_type: MessageType::Text,
        metadata: None,
        reply_to: None,
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_send_and_fan_out() {
    let db = TestDatabase::new().await;
    let pool = db.pool();
    let state = test_state(pool);

    let alice = create_unique_test_user(pool).await.unwrap();
    let bob = create_unique_test_user(pool).await.unwrap();
    let chat = ensure_direct_chat(pool, alice.id, bob.id).await.unwrap();

    // Alice is in the room, Bob is not
    let alice_conn = Uuid::new_v4();
    state.realtime.rooms.join(chat.id, alice_conn, alice.id);
    let mut rx = state.realtime.hub.subscribe();

    let view = engine::send_message(
        pool,
        &state.realtime,
        &state.push,
        chat.id,
        alice.id,
        text_message("hi"),
    )
    .await
    .unwrap();

    assert_eq!(view.sender.as_ref().unwrap().id, alice.id);
    assert_eq!(view.content.as_deref(), Some("hi"));
    assert_eq!(view.chat_id, chat.id);

    // The room broadcast carries the same hydrated shape
    let event = rx.try_recv().unwrap();
    match event.event {
        ServerEvent::NewMessage(broadcast) => assert_eq!(broadcast.id, view.id),
        other => panic!("expected new_message, got {:?}", other),
    }

    // Exactly one push candidate: Bob, who is absent from the room
    let members = member_user_ids(pool, &chat).await.unwrap();
    let present = state.realtime.rooms.users_in_room(chat.id);
    let recipients = compute_recipients(&members, alice.id, &present);
    assert_eq!(recipients, vec![bob.id]);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_send_rejects_bad_input_and_outsiders() {
    let db = TestDatabase::new().await;
    let pool = db.pool();
    let state = test_state(pool);

    let alice = create_unique_test_user(pool).await.unwrap();
    let bob = create_unique_test_user(pool).await.unwrap();
    let mallory = create_unique_test_user(pool).await.unwrap();
    let chat = ensure_direct_chat(pool, alice.id, bob.id).await.unwrap();

    // Markup-only content is empty after sanitization
    let result = engine::send_message(
        pool,
        &state.realtime,
        &state.push,
        chat.id,
        alice.id,
        text_message("<b></b>"),
    )
    .await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));

    // Non-member: forbidden, nothing written
    let result = engine::send_message(
        pool,
        &state.realtime,
        &state.push,
        chat.id,
        mallory.id,
        text_message("let me in"),
    )
    .await;
    assert!(matches!(result, Err(ApiError::Forbidden(_))));

    // Unknown chat: not found, distinct from forbidden
    let result = engine::send_message(
        pool,
        &state.realtime,
        &state.push,
        Uuid::new_v4(),
        alice.id,
        text_message("hello?"),
    )
    .await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));

    let messages = engine::list_messages(pool, chat.id, alice.id, None, None)
        .await
        .unwrap();
    assert!(messages.is_empty());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_duplicate_reaction_is_idempotent() {
    let db = TestDatabase::new().await;
    let pool = db.pool();
    let state = test_state(pool);

    let alice = create_unique_test_user(pool).await.unwrap();
    let bob = create_unique_test_user(pool).await.unwrap();
    let chat = ensure_direct_chat(pool, alice.id, bob.id).await.unwrap();

    let message = engine::send_message(
        pool,
        &state.realtime,
        &state.push,
        chat.id,
        alice.id,
        text_message("react to this"),
    )
    .await
    .unwrap();

    // Same emoji twice: both succeed, one reaction row
    let first = engine::add_reaction(pool, &state.realtime, message.id, bob.id, "👍")
        .await
        .unwrap();
    let second = engine::add_reaction(pool, &state.realtime, message.id, bob.id, "👍")
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].user_ids, vec![bob.id]);

    // A different emoji from the same user is a separate reaction
    let reactions = engine::add_reaction(pool, &state.realtime, message.id, bob.id, "🎉")
        .await
        .unwrap();
    assert_eq!(reactions.len(), 2);

    // Removing a reaction that does not exist is a no-op success
    let reactions = engine::remove_reaction(pool, &state.realtime, message.id, alice.id, "👍")
        .await
        .unwrap();
    assert_eq!(reactions.len(), 2);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_read_receipt_first_read_wins() {
    let db = TestDatabase::new().await;
    let pool = db.pool();
    let state = test_state(pool);

    let alice = create_unique_test_user(pool).await.unwrap();
    let bob = create_unique_test_user(pool).await.unwrap();
    let chat = ensure_direct_chat(pool, alice.id, bob.id).await.unwrap();

    let message = engine::send_message(
        pool,
        &state.realtime,
        &state.push,
        chat.id,
        alice.id,
        text_message("read me"),
    )
    .await
    .unwrap();

    let first = engine::mark_read(pool, &state.realtime, message.id, bob.id)
        .await
        .unwrap();
    let second = engine::mark_read(pool, &state.realtime, message.id, bob.id)
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_pin_is_idempotent() {
    let db = TestDatabase::new().await;
    let pool = db.pool();
    let state = test_state(pool);

    let alice = create_unique_test_user(pool).await.unwrap();
    let bob = create_unique_test_user(pool).await.unwrap();
    let chat = ensure_direct_chat(pool, alice.id, bob.id).await.unwrap();

    let message = engine::send_message(
        pool,
        &state.realtime,
        &state.push,
        chat.id,
        alice.id,
        text_message("pin me"),
    )
    .await
    .unwrap();

    // Any member may pin; pinning twice reports success both times
    let pinned = engine::pin_message(pool, &state.realtime, message.id, bob.id)
        .await
        .unwrap();
    assert!(pinned.pinned);
    engine::pin_message(pool, &state.realtime, message.id, alice.id)
        .await
        .unwrap();

    let pins = engine::list_pins(pool, chat.id, alice.id).await.unwrap();
    assert_eq!(pins.len(), 1);
    assert_eq!(pins[0].id, message.id);

    engine::unpin_message(pool, &state.realtime, message.id, bob.id)
        .await
        .unwrap();
    let pins = engine::list_pins(pool, chat.id, alice.id).await.unwrap();
    assert!(pins.is_empty());

    // Unpinning an unpinned message is a no-op success
    engine::unpin_message(pool, &state.realtime, message.id, bob.id)
        .await
        .unwrap();
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_edit_rules() {
    let db = TestDatabase::new().await;
    let pool = db.pool();
    let state = test_state(pool);

    let alice = create_unique_test_user(pool).await.unwrap();
    let bob = create_unique_test_user(pool).await.unwrap();
    let chat = ensure_direct_chat(pool, alice.id, bob.id).await.unwrap();

    let message = engine::send_message(
        pool,
        &state.realtime,
        &state.push,
        chat.id,
        alice.id,
        text_message("original"),
    )
    .await
    .unwrap();

    // Only the author edits
    let result =
        engine::edit_message(pool, &state.realtime, message.id, bob.id, "hijacked").await;
    assert!(matches!(result, Err(ApiError::Forbidden(_))));

    let edited = engine::edit_message(pool, &state.realtime, message.id, alice.id, "fixed")
        .await
        .unwrap();
    assert_eq!(edited.content.as_deref(), Some("fixed"));
    assert!(edited.edited_at.is_some());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_delete_is_terminal() {
    let db = TestDatabase::new().await;
    let pool = db.pool();
    let state = test_state(pool);

    let alice = create_unique_test_user(pool).await.unwrap();
    let bob = create_unique_test_user(pool).await.unwrap();
    let chat = ensure_direct_chat(pool, alice.id, bob.id).await.unwrap();

    let message = engine::send_message(
        pool,
        &state.realtime,
        &state.push,
        chat.id,
        alice.id,
        text_message("doomed"),
    )
    .await
    .unwrap();

    let first = engine::delete_message(pool, &state.realtime, message.id, alice.id)
        .await
        .unwrap();

    // Editing a deleted message fails and the stored content is untouched
    let result =
        engine::edit_message(pool, &state.realtime, message.id, alice.id, "resurrect").await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    let row = get_message(pool, message.id).await.unwrap().unwrap();
    assert_eq!(row.content.as_deref(), Some("doomed"));
    assert_eq!(row.deleted_at, Some(first));

    // Deleting again succeeds as a no-op and keeps the original timestamp
    let second = engine::delete_message(pool, &state.realtime, message.id, alice.id)
        .await
        .unwrap();
    assert_eq!(first, second);

    // The hydrated shape hides deleted content
    let messages = engine::list_messages(pool, chat.id, alice.id, None, None)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].content.is_none());
    assert!(messages[0].deleted_at.is_some());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_reply_preview_survives_target_deletion() {
    let db = TestDatabase::new().await;
    let pool = db.pool();
    let state = test_state(pool);

    let alice = create_unique_test_user(pool).await.unwrap();
    let bob = create_unique_test_user(pool).await.unwrap();
    let chat = ensure_direct_chat(pool, alice.id, bob.id).await.unwrap();

    let target = engine::send_message(
        pool,
        &state.realtime,
        &state.push,
        chat.id,
        alice.id,
        text_message("quote me"),
    )
    .await
    .unwrap();

    let reply = engine::send_message(
        pool,
        &state.realtime,
        &state.push,
        chat.id,
        bob.id,
        SendMessageRequest {
            content: Some("replying".to_string()),
            message_type: MessageType::Text,
            metadata: None,
            reply_to: Some(target.id),
        },
    )
    .await
    .unwrap();

    engine::delete_message(pool, &state.realtime, target.id, alice.id)
        .await
        .unwrap();

    // The preview still renders from the original content
    let messages = engine::list_messages(pool, chat.id, alice.id, None, None)
        .await
        .unwrap();
    let hydrated_reply = messages.iter().find(|m| m.id == reply.id).unwrap();
    let preview = hydrated_reply.reply_to.as_ref().unwrap();
    assert_eq!(preview.content.as_deref(), Some("quote me"));
    assert!(preview.deleted);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_pagination_walks_backwards() {
    let db = TestDatabase::new().await;
    let pool = db.pool();
    let state = test_state(pool);

    let alice = create_unique_test_user(pool).await.unwrap();
    let bob = create_unique_test_user(pool).await.unwrap();
    let chat = ensure_direct_chat(pool, alice.id, bob.id).await.unwrap();

    let mut ids = Vec::new();
    for i in 0..5 {
        let view = engine::send_message(
            pool,
            &state.realtime,
            &state.push,
            chat.id,
            alice.id,
            text_message(&format!("m{i}")),
        )
        .await
        .unwrap();
        ids.push(view.id);
    }

    // Latest page, oldest -> newest within the page
    let page = engine::list_messages(pool, chat.id, alice.id, Some(2), None)
        .await
        .unwrap();
    assert_eq!(
        page.iter().map(|m| m.id).collect::<Vec<_>>(),
        vec![ids[3], ids[4]]
    );

    // Cursor page: strictly older than the first message of the last page
    let earlier = engine::list_messages(pool, chat.id, alice.id, Some(2), Some(ids[3]))
        .await
        .unwrap();
    assert_eq!(
        earlier.iter().map(|m| m.id).collect::<Vec<_>>(),
        vec![ids[1], ids[2]]
    );
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_broadcast_order_matches_commit_order() {
    let db = TestDatabase::new().await;
    let pool = db.pool();
    let state = test_state(pool);

    let alice = create_unique_test_user(pool).await.unwrap();
    let bob = create_unique_test_user(pool).await.unwrap();
    let chat = ensure_direct_chat(pool, alice.id, bob.id).await.unwrap();

    let mut rx = state.realtime.hub.subscribe();

    let mut sent = Vec::new();
    for i in 0..4 {
        let view = engine::send_message(
            pool,
            &state.realtime,
            &state.push,
            chat.id,
            alice.id,
            text_message(&format!("n{i}")),
        )
        .await
        .unwrap();
        sent.push(view.id);
    }

    for expected in sent {
        match rx.try_recv().unwrap().event {
            ServerEvent::NewMessage(view) => assert_eq!(view.id, expected),
            other => panic!("expected new_message, got {:?}", other),
        }
    }
}
