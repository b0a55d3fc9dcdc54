//! # Query Cache
//!
//! Process-wide, type-erased cache of query results, supporting:
//! - **Request deduplication**: at most one in-flight fetch per key.
//! - **Generations**: invalidating a key bumps its generation so a fetch that
//!   started earlier cannot overwrite fresher state when it lands.
//! - **Resource invalidation**: drop every key of a resource (`users`, `users/7`,
//!   `users?role=pro`) in one call.
//! - **Retention**: entries nobody subscribes to are collected once they have not
//!   been read for the retention window.
//!
//! ## Example
//! ```rust,no_run
//! use marketplace_provider::cache::QueryCache;
//! let cache = QueryCache::new();
//! cache.set("users".to_string(), vec![1, 2, 3]);
//! let value: Option<Vec<i32>> = cache.get("users");
//! ```

use std::{
    any::Any,
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering},
    },
    time::{Duration, Instant},
};

use crate::key::QueryKey;

/// A type-erased cache entry with timestamp and access tracking
#[derive(Clone)]
pub struct CacheEntry {
    data: Arc<dyn Any + Send + Sync>,
    cached_at: Arc<Mutex<Instant>>,
    last_accessed: Arc<Mutex<Instant>>,
    access_count: Arc<AtomicU32>,
}

impl CacheEntry {
    pub fn new<T: Clone + Send + Sync + 'static>(data: T) -> Self {
        let now = Instant::now();
        Self {
            data: Arc::new(data),
            cached_at: Arc::new(Mutex::new(now)),
            last_accessed: Arc::new(Mutex::new(now)),
            access_count: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Reads the value as `T`, recording the access.
    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        if let Ok(mut last_accessed) = self.last_accessed.lock() {
            *last_accessed = Instant::now();
        }
        self.access_count.fetch_add(1, Ordering::SeqCst);
        self.data.downcast_ref::<T>().cloned()
    }

    pub fn refresh_timestamp(&self) {
        if let Ok(mut cached_at) = self.cached_at.lock() {
            *cached_at = Instant::now();
        }
    }

    pub fn access_count(&self) -> u32 {
        self.access_count.load(Ordering::SeqCst)
    }

    pub fn time_since_last_access(&self) -> Duration {
        self.last_accessed
            .lock()
            .map(|last| last.elapsed())
            .unwrap_or_default()
    }

    pub fn is_unused_for(&self, duration: Duration) -> bool {
        self.time_since_last_access() > duration
    }

    /// Time since the value was stored
    pub fn age(&self) -> Duration {
        self.cached_at
            .lock()
            .map(|cached_at| cached_at.elapsed())
            .unwrap_or_default()
    }
}

/// Per-key bookkeeping that outlives the cached value itself
#[derive(Debug, Default, Clone, Copy)]
struct KeyMeta {
    generation: u64,
    subscribers: u32,
    pending: bool,
}

/// Proof that the holder started the in-flight fetch for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

/// What happened to a fetch result handed back to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Stored; `changed` is false when it equals the previous value
    Stored { changed: bool },
    /// The key was invalidated while the fetch was in flight; the result was dropped
    Superseded,
}

/// Global cache for query results
#[derive(Clone, Default)]
pub struct QueryCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
    meta: Arc<Mutex<HashMap<String, KeyMeta>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves a cached value by key.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<T> {
        self.entries.lock().ok()?.get(key)?.get::<T>()
    }

    /// Whether a value is cached for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    /// Stores a value.
    ///
    /// Returns `false` when the value equals what is already cached; in that case
    /// only the timestamp is refreshed.
    pub fn set<T: Clone + Send + Sync + PartialEq + 'static>(&self, key: String, value: T) -> bool {
        let Ok(mut entries) = self.entries.lock() else {
            return false;
        };
        if let Some(existing_entry) = entries.get_mut(&key)
            && let Some(existing_value) = existing_entry.get::<T>()
            && existing_value == value
        {
            existing_entry.refresh_timestamp();
            crate::debug_log!(
                "⏸️ [CACHE-STORE] Value unchanged for key: {}, refreshing timestamp",
                key
            );
            return false;
        }
        crate::log_cache_store!("Stored data for key: {}", key);
        entries.insert(key, CacheEntry::new(value));
        true
    }

    /// Claims the in-flight slot for `key`.
    ///
    /// Returns `None` when another fetch for the same key is already running; the
    /// caller should wait for the refresh that fetch triggers instead of issuing a
    /// duplicate request.
    pub fn begin_fetch(&self, key: &str) -> Option<FetchTicket> {
        let mut meta = self.meta.lock().ok()?;
        let entry = meta.entry(key.to_string()).or_default();
        if entry.pending {
            crate::debug_log!("🔄 [REQUEST-DEDUP] Request already pending for key: {}", key);
            return None;
        }
        entry.pending = true;
        crate::debug_log!("🆕 [REQUEST-DEDUP] Starting new request for key: {}", key);
        Some(FetchTicket {
            generation: entry.generation,
        })
    }

    /// Hands a fetch result back.
    ///
    /// The value is only stored if the key has not been invalidated since
    /// [`begin_fetch`](Self::begin_fetch) issued `ticket`.
    pub fn complete_fetch<T: Clone + Send + Sync + PartialEq + 'static>(
        &self,
        key: &str,
        ticket: FetchTicket,
        value: T,
    ) -> FetchOutcome {
        if !self.release_if_current(key, ticket) {
            crate::debug_log!(
                "⏭️ [REQUEST-DEDUP] Dropping superseded result for key: {}",
                key
            );
            return FetchOutcome::Superseded;
        }
        let changed = self.set(key.to_string(), value);
        crate::debug_log!("✅ [REQUEST-DEDUP] Request completed for key: {}", key);
        FetchOutcome::Stored { changed }
    }

    /// Releases the in-flight slot without storing anything (cancelled fetch).
    ///
    /// Returns whether the slot was still owned by `ticket`.
    pub fn abandon_fetch(&self, key: &str, ticket: FetchTicket) -> bool {
        self.release_if_current(key, ticket)
    }

    fn release_if_current(&self, key: &str, ticket: FetchTicket) -> bool {
        let Ok(mut meta) = self.meta.lock() else {
            return false;
        };
        match meta.get_mut(key) {
            Some(entry) if entry.pending && entry.generation == ticket.generation => {
                entry.pending = false;
                true
            }
            _ => false,
        }
    }

    /// Whether a fetch is in flight for `key`
    pub fn is_request_pending(&self, key: &str) -> bool {
        self.meta
            .lock()
            .map(|meta| meta.get(key).is_some_and(|m| m.pending))
            .unwrap_or(false)
    }

    /// Current generation of `key`; bumped on every invalidation
    pub fn generation(&self, key: &str) -> u64 {
        self.meta
            .lock()
            .map(|meta| meta.get(key).map_or(0, |m| m.generation))
            .unwrap_or(0)
    }

    /// Registers a subscriber (a mounted hook) for `key`
    pub fn subscribe(&self, key: &str) {
        if let Ok(mut meta) = self.meta.lock() {
            meta.entry(key.to_string()).or_default().subscribers += 1;
        }
    }

    /// Drops a subscriber; returns how many remain
    pub fn unsubscribe(&self, key: &str) -> u32 {
        let Ok(mut meta) = self.meta.lock() else {
            return 0;
        };
        match meta.get_mut(key) {
            Some(entry) => {
                entry.subscribers = entry.subscribers.saturating_sub(1);
                entry.subscribers
            }
            None => 0,
        }
    }

    pub fn subscriber_count(&self, key: &str) -> u32 {
        self.meta
            .lock()
            .map(|meta| meta.get(key).map_or(0, |m| m.subscribers))
            .unwrap_or(0)
    }

    /// Invalidates a single key: the value is removed, any in-flight fetch is
    /// superseded and the generation moves forward.
    pub fn invalidate(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
        if let Ok(mut meta) = self.meta.lock() {
            let entry = meta.entry(key.to_string()).or_default();
            entry.generation += 1;
            entry.pending = false;
        }
        crate::log_cache_invalidate!("Invalidated cache entry for key: {}", key);
    }

    /// Invalidates every key belonging to `resource` and returns them.
    pub fn invalidate_resource(&self, resource: &str) -> Vec<String> {
        let mut keys: HashSet<String> = HashSet::new();
        if let Ok(entries) = self.entries.lock() {
            keys.extend(
                entries
                    .keys()
                    .filter(|k| QueryKey::resource_of(k) == resource)
                    .cloned(),
            );
        }
        if let Ok(meta) = self.meta.lock() {
            keys.extend(
                meta.keys()
                    .filter(|k| QueryKey::resource_of(k) == resource)
                    .cloned(),
            );
        }
        // The bare resource key is always touched so a list that has not been
        // fetched yet still starts from a fresh generation.
        keys.insert(resource.to_string());

        let mut keys: Vec<String> = keys.into_iter().collect();
        keys.sort();
        for key in &keys {
            self.invalidate(key);
        }
        crate::log_cache_invalidate!(
            "Invalidated {} keys for resource: {}",
            keys.len(),
            resource
        );
        keys
    }

    /// Clears all cached values. Generations move forward for every known key.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            #[cfg(feature = "tracing")]
            let count = entries.len();
            entries.clear();
            #[cfg(feature = "tracing")]
            crate::debug_log!("🗑️ [CACHE-CLEAR] Cleared {} cache entries", count);
        }
        if let Ok(mut meta) = self.meta.lock() {
            for entry in meta.values_mut() {
                entry.generation += 1;
                entry.pending = false;
            }
        }
    }

    pub fn size(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Removes entries that have no subscribers and were not read within `retention`.
    pub fn collect_garbage(&self, retention: Duration) -> usize {
        let subscribed: HashSet<String> = self
            .meta
            .lock()
            .map(|meta| {
                meta.iter()
                    .filter(|(_, m)| m.subscribers > 0)
                    .map(|(k, _)| k.clone())
                    .collect()
            })
            .unwrap_or_default();

        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let initial_size = entries.len();
        entries.retain(|key, entry| subscribed.contains(key) || !entry.is_unused_for(retention));
        let removed = initial_size - entries.len();
        if removed > 0 {
            crate::debug_log!("🧹 [CACHE-CLEANUP] Removed {} unreferenced entries", removed);
        }
        removed
    }

    /// Evicts least recently used entries to keep at most `max_size`.
    pub fn evict_lru_entries(&self, max_size: usize) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        if entries.len() <= max_size {
            return 0;
        }

        let mut all: Vec<_> = entries.drain().collect();
        // Most recently used first
        all.sort_by_key(|(_, entry)| entry.time_since_last_access());
        let evicted = all.split_off(max_size).len();
        entries.extend(all);

        crate::debug_log!(
            "🗑️ [LRU-EVICT] Evicted {} entries due to cache size limit",
            evicted
        );
        evicted
    }

    pub fn stats(&self) -> CacheStats {
        let Ok(entries) = self.entries.lock() else {
            return CacheStats::default();
        };
        let mut total_age = Duration::ZERO;
        let mut total_accesses = 0;
        for entry in entries.values() {
            total_age += entry.age();
            total_accesses += entry.access_count();
        }
        let entry_count = entries.len();
        let avg_age = if entry_count > 0 {
            total_age / entry_count as u32
        } else {
            Duration::ZERO
        };
        let pending_requests = self
            .meta
            .lock()
            .map(|meta| meta.values().filter(|m| m.pending).count())
            .unwrap_or(0);

        CacheStats {
            entry_count,
            total_accesses,
            avg_age,
            pending_requests,
        }
    }
}

/// General cache statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub entry_count: usize,
    pub total_accesses: u32,
    pub avg_age: Duration,
    pub pending_requests: usize,
}

impl CacheStats {
    pub fn avg_accesses_per_entry(&self) -> f64 {
        if self.entry_count > 0 {
            self.total_accesses as f64 / self.entry_count as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_reports_unchanged_values() {
        let cache = QueryCache::new();
        assert!(cache.set("users".to_string(), vec![1, 2]));
        assert!(!cache.set("users".to_string(), vec![1, 2]));
        assert!(cache.set("users".to_string(), vec![1, 2, 3]));
        assert_eq!(cache.get::<Vec<i32>>("users"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn second_fetch_for_same_key_is_deduplicated() {
        let cache = QueryCache::new();
        let ticket = cache.begin_fetch("users").expect("first fetch");
        assert!(cache.begin_fetch("users").is_none());
        assert!(cache.begin_fetch("users/1").is_some());

        assert_eq!(
            cache.complete_fetch("users", ticket, 7u32),
            FetchOutcome::Stored { changed: true }
        );
        assert!(!cache.is_request_pending("users"));
        assert!(cache.begin_fetch("users").is_some());
    }

    #[test]
    fn invalidation_supersedes_in_flight_fetch() {
        let cache = QueryCache::new();
        let stale = cache.begin_fetch("users").expect("first fetch");
        cache.invalidate("users");

        let fresh = cache.begin_fetch("users").expect("slot freed by invalidation");
        assert_eq!(
            cache.complete_fetch("users", stale, "old".to_string()),
            FetchOutcome::Superseded
        );
        assert!(cache.is_request_pending("users"), "fresh fetch still owns the slot");
        assert_eq!(
            cache.complete_fetch("users", fresh, "new".to_string()),
            FetchOutcome::Stored { changed: true }
        );
        assert_eq!(cache.get::<String>("users").as_deref(), Some("new"));
    }

    #[test]
    fn resource_invalidation_leaves_other_resources_alone() {
        let cache = QueryCache::new();
        cache.set("users".to_string(), 1u8);
        cache.set("users/7".to_string(), 2u8);
        cache.set("users?role=pro".to_string(), 3u8);
        cache.set("bookings".to_string(), 4u8);
        cache.set("users_admin".to_string(), 5u8);

        let keys = cache.invalidate_resource("users");
        assert_eq!(keys, vec!["users", "users/7", "users?role=pro"]);
        assert!(!cache.contains("users/7"));
        assert_eq!(cache.get::<u8>("bookings"), Some(4));
        assert_eq!(cache.get::<u8>("users_admin"), Some(5));
        assert_eq!(cache.generation("bookings"), 0);
        assert_eq!(cache.generation("users/7"), 1);
    }

    #[test]
    fn abandon_releases_slot_only_for_owner() {
        let cache = QueryCache::new();
        let ticket = cache.begin_fetch("services").expect("fetch");
        cache.invalidate("services");
        assert!(!cache.abandon_fetch("services", ticket));

        let ticket = cache.begin_fetch("services").expect("fetch");
        assert!(cache.abandon_fetch("services", ticket));
        assert!(!cache.is_request_pending("services"));
    }

    #[test]
    fn garbage_collection_keeps_subscribed_entries() {
        let cache = QueryCache::new();
        cache.set("users".to_string(), 1u8);
        cache.set("bookings".to_string(), 2u8);
        cache.subscribe("users");

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.collect_garbage(Duration::from_millis(5)), 1);
        assert!(cache.contains("users"));
        assert!(!cache.contains("bookings"));

        assert_eq!(cache.unsubscribe("users"), 0);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.collect_garbage(Duration::from_millis(5)), 1);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn lru_eviction_keeps_most_recent() {
        let cache = QueryCache::new();
        cache.set("a".to_string(), 1u8);
        std::thread::sleep(Duration::from_millis(5));
        cache.set("b".to_string(), 2u8);
        std::thread::sleep(Duration::from_millis(5));
        let _ = cache.get::<u8>("a");

        assert_eq!(cache.evict_lru_entries(1), 1);
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
    }
}
