//! Shared runtime components that back the query hooks.
//!
//! The runtime bundles the query cache and the refresh registry and is the only
//! place invalidation happens: dropping a cached value and waking its readers
//! always go together.

pub mod cache_mgmt;
pub mod request;

use std::time::Duration;

use crate::{
    cache::{CacheStats, QueryCache},
    config::{DEFAULT_CACHE_RETENTION, DEFAULT_MAX_CACHE_ENTRIES},
    key::QueryKey,
    refresh::RefreshRegistry,
};
use cache_mgmt::{MAINTENANCE_TASK, setup_cache_maintenance};

/// Configuration for the query runtime.
#[derive(Debug, Clone)]
pub struct QueryRuntimeConfig {
    /// How long an entry without subscribers survives after its last read
    pub cache_retention: Duration,
    /// Upper bound on cached results
    pub max_cache_entries: usize,
}

impl Default for QueryRuntimeConfig {
    fn default() -> Self {
        Self {
            cache_retention: DEFAULT_CACHE_RETENTION,
            max_cache_entries: DEFAULT_MAX_CACHE_ENTRIES,
        }
    }
}

/// Central runtime that holds onto the core singletons.
#[derive(Clone, Default)]
pub struct QueryRuntime {
    cache: QueryCache,
    refresh_registry: RefreshRegistry,
    config: QueryRuntimeConfig,
}

impl QueryRuntime {
    /// Construct a new runtime instance using the provided configuration.
    pub fn new(config: QueryRuntimeConfig) -> Self {
        Self {
            cache: QueryCache::new(),
            refresh_registry: RefreshRegistry::new(),
            config,
        }
    }

    /// Access the cache handle.
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Access the refresh registry handle.
    pub fn refresh_registry(&self) -> &RefreshRegistry {
        &self.refresh_registry
    }

    pub fn config(&self) -> &QueryRuntimeConfig {
        &self.config
    }

    /// Drops the cached result for `key` and wakes every hook reading it.
    pub fn invalidate(&self, key: &QueryKey) {
        let cache_key = key.cache_key();
        self.cache.invalidate(&cache_key);
        self.refresh_registry.trigger_refresh(&cache_key);
    }

    /// Drops every cached result of `resource` (list, items, parameterized lists)
    /// and wakes their readers.
    pub fn invalidate_resource(&self, resource: &str) {
        let keys = self.cache.invalidate_resource(resource);
        self.refresh_registry
            .trigger_resource_refresh(resource, &keys);
    }

    /// Drops everything and wakes every mounted query.
    pub fn clear(&self) {
        self.cache.clear();
        self.refresh_registry.clear_all();
    }

    /// Registers a mounted hook as a reader of `cache_key`.
    pub fn retain(&self, cache_key: &str) {
        self.cache.subscribe(cache_key);
    }

    /// Unregisters a reader; the entry becomes collectable once nobody reads it.
    pub fn release(&self, cache_key: &str) {
        if self.cache.unsubscribe(cache_key) == 0 {
            self.refresh_registry.remove_subscribers(cache_key);
        }
    }

    /// Starts the retention task if it is not running yet.
    ///
    /// Does nothing outside a tokio runtime; called again from every query mount
    /// so the task comes up as soon as one is available.
    pub fn ensure_maintenance(&self) {
        if self.refresh_registry.is_periodic_task_running(MAINTENANCE_TASK) {
            return;
        }
        setup_cache_maintenance(
            &self.cache,
            &self.refresh_registry,
            self.config.cache_retention,
            self.config.max_cache_entries,
        );
    }

    pub fn stop_maintenance(&self) {
        self.refresh_registry.stop_periodic_task(MAINTENANCE_TASK);
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidation_wakes_and_drops() {
        let runtime = QueryRuntime::default();
        let key = QueryKey::item("services", 4);
        runtime.cache().set(key.cache_key(), 1u8);

        runtime.invalidate(&key);
        assert!(!runtime.cache().contains("services/4"));
        assert_eq!(runtime.refresh_registry().get_refresh_count("services/4"), 1);
        assert_eq!(runtime.cache().generation("services/4"), 1);
    }

    #[test]
    fn resource_invalidation_reaches_unfetched_list() {
        let runtime = QueryRuntime::default();
        runtime.cache().set("bookings/1".to_string(), 1u8);
        runtime.cache().set("categories".to_string(), 2u8);

        runtime.invalidate_resource("bookings");
        assert_eq!(runtime.refresh_registry().get_refresh_count("bookings"), 1);
        assert_eq!(runtime.refresh_registry().get_refresh_count("bookings/1"), 1);
        assert_eq!(runtime.refresh_registry().get_refresh_count("categories"), 0);
        assert!(runtime.cache().contains("categories"));
    }

    #[test]
    fn release_forgets_last_reader() {
        let runtime = QueryRuntime::default();
        runtime.retain("users");
        runtime.retain("users");
        runtime.release("users");
        assert_eq!(runtime.cache().subscriber_count("users"), 1);
        runtime.release("users");
        assert_eq!(runtime.cache().subscriber_count("users"), 0);
    }

    #[tokio::test]
    async fn maintenance_starts_once_inside_tokio() {
        let runtime = QueryRuntime::default();
        runtime.ensure_maintenance();
        runtime.ensure_maintenance();
        assert!(runtime.refresh_registry().is_periodic_task_running(MAINTENANCE_TASK));
        runtime.stop_maintenance();
        assert!(!runtime.refresh_registry().is_periodic_task_running(MAINTENANCE_TASK));
    }
}
