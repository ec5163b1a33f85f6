//! Realtime Module
//!
//! The WebSocket gateway and its supporting state: the broadcast hub,
//! per-chat rooms, presence tracking, and the membership authorization
//! cache. All of it is process-local; scaling beyond one process means
//! externalizing this state to a shared pub/sub store.

pub mod broadcast;
pub mod gateway;
pub mod presence;
pub mod rooms;

use std::sync::Arc;

use crate::backend::membership::cache::MembershipCache;

pub use broadcast::EventHub;
pub use presence::PresenceTracker;
pub use rooms::RoomRegistry;

/// Shared state owned by the realtime layer.
///
/// The maps inside are never handed out directly; other components go
/// through the accessor methods on the registries.
#[derive(Clone)]
pub struct RealtimeState {
    /// Fan-out channel every gateway session subscribes to
    pub hub: EventHub,
    /// chat -> connections currently joined
    pub rooms: Arc<RoomRegistry>,
    /// user -> open connection set
    pub presence: Arc<PresenceTracker>,
    /// TTL-bounded (user, chat) authorization cache for room joins
    pub membership_cache: Arc<MembershipCache>,
}

impl Default for RealtimeState {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeState {
    pub fn new() -> Self {
        Self {
            hub: EventHub::new(),
            rooms: Arc::new(RoomRegistry::new()),
            presence: Arc::new(PresenceTracker::new()),
            membership_cache: Arc::new(MembershipCache::new()),
        }
    }
}
