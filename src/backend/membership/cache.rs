//! Membership Authorization Cache
//!
//! A positive-only cache of (user, chat) membership decisions with a short
//! TTL. The realtime gateway re-validates membership on every room join;
//! this cache bounds that to at most one store round-trip per entry per
//! TTL window. Kicks, leaves, and joins become visible to the gateway
//! within the TTL; the durable membership tables remain the source of
//! truth.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

/// Default entry lifetime
const DEFAULT_TTL: Duration = Duration::from_secs(5);

/// TTL-bounded cache of positive membership decisions
#[derive(Debug)]
pub struct MembershipCache {
    entries: Mutex<HashMap<(Uuid, Uuid), Instant>>,
    ttl: Duration,
}

impl Default for MembershipCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MembershipCache {
    /// Cache with the default 5-second TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Cache with an explicit TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Whether a still-valid positive entry exists. Expired entries are
    /// removed on the way out.
    pub fn check(&self, user_id: Uuid, chat_id: Uuid) -> bool {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(&(user_id, chat_id)) {
            Some(expires_at) if Instant::now() < *expires_at => true,
            Some(_) => {
                entries.remove(&(user_id, chat_id));
                false
            }
            None => false,
        }
    }

    /// Record a positive membership decision
    pub fn insert(&self, user_id: Uuid, chat_id: Uuid) {
        let expires_at = Instant::now() + self.ttl;
        self.entries
            .lock()
            .unwrap()
            .insert((user_id, chat_id), expires_at);
    }

    /// Drop every expired entry. Called periodically so a long-running
    /// gateway does not accumulate entries for rooms nobody rejoins.
    pub fn evict_expired(&self) {
        let now = Instant::now();
        self.entries
            .lock()
            .unwrap()
            .retain(|_, expires_at| now < *expires_at);
    }

    /// Number of live entries (expired entries may still be counted until
    /// the next eviction)
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_then_hit() {
        let cache = MembershipCache::new();
        let user = Uuid::new_v4();
        let chat = Uuid::new_v4();

        assert!(!cache.check(user, chat));
        cache.insert(user, chat);
        assert!(cache.check(user, chat));
    }

    #[test]
    fn test_entries_are_scoped_per_pair() {
        let cache = MembershipCache::new();
        let user = Uuid::new_v4();
        let chat = Uuid::new_v4();
        cache.insert(user, chat);

        assert!(!cache.check(user, Uuid::new_v4()));
        assert!(!cache.check(Uuid::new_v4(), chat));
    }

    #[test]
    fn test_expired_entry_misses_and_is_pruned() {
        let cache = MembershipCache::with_ttl(Duration::ZERO);
        let user = Uuid::new_v4();
        let chat = Uuid::new_v4();
        cache.insert(user, chat);

        assert!(!cache.check(user, chat));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_evict_expired() {
        let cache = MembershipCache::with_ttl(Duration::ZERO);
        cache.insert(Uuid::new_v4(), Uuid::new_v4());
        cache.insert(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(cache.len(), 2);

        cache.evict_expired();
        assert!(cache.is_empty());
    }
}
