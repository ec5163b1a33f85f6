//! Realtime layer tests
//!
//! Drives the presence tracker, room registry, and broadcast hub together
//! the way the gateway does, without sockets or a database.

use uuid::Uuid;

use ripple::backend::realtime::{EventHub, PresenceTracker, RoomRegistry};
use ripple::shared::event::{PresenceStatus, RoomEvent, ServerEvent};

/// Replicates the gateway's connect/disconnect presence protocol: a
/// transition broadcast fires only when the tracker reports a boundary.
fn connect(presence: &PresenceTracker, hub: &EventHub, user: Uuid, conn: Uuid) {
    if presence.connect(user, conn) {
        hub.broadcast(RoomEvent::global(ServerEvent::PresenceUpdate {
            user_id: user,
            status: PresenceStatus::Online,
        }));
    }
}

fn disconnect(presence: &PresenceTracker, hub: &EventHub, user: Uuid, conn: Uuid) {
    if presence.disconnect(user, conn) {
        hub.broadcast(RoomEvent::global(ServerEvent::PresenceUpdate {
            user_id: user,
            status: PresenceStatus::Offline,
        }));
    }
}

#[tokio::test]
async fn test_presence_fires_once_across_devices() {
    let presence = PresenceTracker::new();
    let hub = EventHub::new();
    let mut rx = hub.subscribe();

    let user = Uuid::new_v4();
    let conns: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

    // Three devices connect, two drop, one reconnects, then all close
    connect(&presence, &hub, user, conns[0]);
    connect(&presence, &hub, user, conns[1]);
    connect(&presence, &hub, user, conns[2]);
    disconnect(&presence, &hub, user, conns[0]);
    disconnect(&presence, &hub, user, conns[1]);
    connect(&presence, &hub, user, conns[0]);
    disconnect(&presence, &hub, user, conns[0]);
    disconnect(&presence, &hub, user, conns[2]);

    // Exactly one online and one offline event, in that order
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event.event);
    }
    assert_eq!(
        events,
        vec![
            ServerEvent::PresenceUpdate {
                user_id: user,
                status: PresenceStatus::Online,
            },
            ServerEvent::PresenceUpdate {
                user_id: user,
                status: PresenceStatus::Offline,
            },
        ]
    );
}

#[tokio::test]
async fn test_presence_snapshot_reflects_current_state() {
    let presence = PresenceTracker::new();
    let hub = EventHub::new();

    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let bob_conn = Uuid::new_v4();
    connect(&presence, &hub, alice, Uuid::new_v4());
    connect(&presence, &hub, bob, bob_conn);
    disconnect(&presence, &hub, bob, bob_conn);

    assert_eq!(presence.online_users(), vec![alice]);
}

#[tokio::test]
async fn test_hub_fans_out_to_every_subscriber() {
    let hub = EventHub::new();
    let mut rx1 = hub.subscribe();
    let mut rx2 = hub.subscribe();

    let chat_id = Uuid::new_v4();
    let count = hub.broadcast(RoomEvent::chat(
        chat_id,
        ServerEvent::MessageUnpinned {
            chat_id,
            message_id: Uuid::new_v4(),
        },
    ));
    assert_eq!(count, 2);
    assert!(rx1.try_recv().is_ok());
    assert!(rx2.try_recv().is_ok());
}

#[tokio::test]
async fn test_room_presence_feeds_fanout_exclusions() {
    // The dispatcher treats a user as "present" while any of their
    // connections is in the room, even after one device leaves
    let rooms = RoomRegistry::new();
    let chat = Uuid::new_v4();
    let user = Uuid::new_v4();
    let (phone, laptop) = (Uuid::new_v4(), Uuid::new_v4());

    rooms.join(chat, phone, user);
    rooms.join(chat, laptop, user);
    rooms.leave(chat, phone);
    assert!(rooms.users_in_room(chat).contains(&user));

    rooms.leave_all(laptop);
    assert!(!rooms.users_in_room(chat).contains(&user));
}
