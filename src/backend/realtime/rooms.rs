//! Room Registry
//!
//! Tracks which connections are joined to which chat rooms, and which user
//! each connection belongs to. The push dispatcher reads this to decide
//! who is "present" in a room (and therefore needs no push notification).

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use uuid::Uuid;

/// chat -> connection -> user
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<Uuid, HashMap<Uuid, Uuid>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a chat's room
    pub fn join(&self, chat_id: Uuid, conn_id: Uuid, user_id: Uuid) {
        self.rooms
            .lock()
            .unwrap()
            .entry(chat_id)
            .or_default()
            .insert(conn_id, user_id);
    }

    /// Remove a connection from a chat's room. Unconditional; leaving a
    /// room never requires re-authorization.
    pub fn leave(&self, chat_id: Uuid, conn_id: Uuid) {
        let mut rooms = self.rooms.lock().unwrap();
        if let Some(room) = rooms.get_mut(&chat_id) {
            room.remove(&conn_id);
            if room.is_empty() {
                rooms.remove(&chat_id);
            }
        }
    }

    /// Remove a connection from every room it joined. Called on
    /// disconnect, however the connection closed.
    pub fn leave_all(&self, conn_id: Uuid) {
        let mut rooms = self.rooms.lock().unwrap();
        rooms.retain(|_, room| {
            room.remove(&conn_id);
            !room.is_empty()
        });
    }

    /// Distinct users with at least one connection in the chat's room
    pub fn users_in_room(&self, chat_id: Uuid) -> HashSet<Uuid> {
        self.rooms
            .lock()
            .unwrap()
            .get(&chat_id)
            .map(|room| room.values().copied().collect())
            .unwrap_or_default()
    }

    /// Number of connections in the room (for diagnostics)
    pub fn connection_count(&self, chat_id: Uuid) -> usize {
        self.rooms
            .lock()
            .unwrap()
            .get(&chat_id)
            .map(HashMap::len)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_leave() {
        let rooms = RoomRegistry::new();
        let chat = Uuid::new_v4();
        let conn = Uuid::new_v4();
        let user = Uuid::new_v4();

        rooms.join(chat, conn, user);
        assert!(rooms.users_in_room(chat).contains(&user));

        rooms.leave(chat, conn);
        assert!(rooms.users_in_room(chat).is_empty());
    }

    #[test]
    fn test_users_deduplicated_across_connections() {
        let rooms = RoomRegistry::new();
        let chat = Uuid::new_v4();
        let user = Uuid::new_v4();

        rooms.join(chat, Uuid::new_v4(), user);
        rooms.join(chat, Uuid::new_v4(), user);

        assert_eq!(rooms.users_in_room(chat).len(), 1);
        assert_eq!(rooms.connection_count(chat), 2);
    }

    #[test]
    fn test_leave_all_clears_every_room() {
        let rooms = RoomRegistry::new();
        let conn = Uuid::new_v4();
        let user = Uuid::new_v4();
        let (chat_a, chat_b) = (Uuid::new_v4(), Uuid::new_v4());

        rooms.join(chat_a, conn, user);
        rooms.join(chat_b, conn, user);
        rooms.leave_all(conn);

        assert!(rooms.users_in_room(chat_a).is_empty());
        assert!(rooms.users_in_room(chat_b).is_empty());
    }

    #[test]
    fn test_leave_unknown_room_is_noop() {
        let rooms = RoomRegistry::new();
        rooms.leave(Uuid::new_v4(), Uuid::new_v4());
    }
}
