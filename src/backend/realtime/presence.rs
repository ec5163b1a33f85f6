//! Presence Tracking
//!
//! Tracks, per user, the set of currently-open gateway connections. A user
//! is online while at least one connection is open. The online/offline
//! transition fires exactly once per 0<->N boundary: a second device
//! connecting or one of several devices dropping produces no event.
//!
//! State is process-local and connection-count-driven; nothing here is
//! persisted.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use uuid::Uuid;

/// Per-user connection sets
#[derive(Debug, Default)]
pub struct PresenceTracker {
    connections: Mutex<HashMap<Uuid, HashSet<Uuid>>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection for a user.
    ///
    /// # Returns
    ///
    /// `true` when this is the user's first open connection, i.e. the
    /// caller should broadcast an "online" transition.
    pub fn connect(&self, user_id: Uuid, conn_id: Uuid) -> bool {
        let mut connections = self.connections.lock().unwrap();
        let set = connections.entry(user_id).or_default();
        set.insert(conn_id);
        set.len() == 1
    }

    /// Remove a connection for a user, however it closed.
    ///
    /// # Returns
    ///
    /// `true` when this was the user's last open connection, i.e. the
    /// caller should broadcast an "offline" transition.
    pub fn disconnect(&self, user_id: Uuid, conn_id: Uuid) -> bool {
        let mut connections = self.connections.lock().unwrap();
        match connections.get_mut(&user_id) {
            Some(set) => {
                set.remove(&conn_id);
                if set.is_empty() {
                    connections.remove(&user_id);
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    /// Snapshot of all currently-online user ids, for the one-time
    /// `presence:initial_state` sent to each new connection
    pub fn online_users(&self) -> Vec<Uuid> {
        self.connections.lock().unwrap().keys().copied().collect()
    }

    /// Whether the user has at least one open connection
    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.connections.lock().unwrap().contains_key(&user_id)
    }
}
