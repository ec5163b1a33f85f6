//! Realtime Event Broadcasting
//!
//! A single `tokio::sync::broadcast` channel fans events out to every
//! connected gateway session. Each session subscribes once and filters
//! locally against its own joined-room set; this is the right shape for a
//! single-process gateway.
//!
//! Lifecycle events are sent here only after the durable write they report
//! has committed, so room members never observe an event for data that is
//! not yet queryable.

use tokio::sync::broadcast;

use crate::shared::event::RoomEvent;

/// Capacity of the broadcast channel. Slow receivers that fall behind skip
/// events (RecvError::Lagged) and catch up on the next one.
const BROADCAST_CAPACITY: usize = 4096;

/// The gateway's event hub. Cloneable; store in AppState.
#[derive(Clone)]
pub struct EventHub {
    sender: broadcast::Sender<RoomEvent>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Subscribe to the hub. Each gateway session calls this once.
    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.sender.subscribe()
    }

    /// Dispatch an event to all connected sessions.
    ///
    /// # Returns
    ///
    /// Number of active subscribers that received the event (0 if none)
    pub fn broadcast(&self, event: RoomEvent) -> usize {
        match self.sender.send(event) {
            Ok(subscriber_count) => subscriber_count,
            Err(_) => {
                // No subscribers connected
                tracing::debug!("[Realtime] No subscribers to receive event");
                0
            }
        }
    }
}
