//! Refresh registry
//!
//! Tracks which reactive contexts (mounted query hooks) read which cache keys and
//! wakes them when a key is invalidated or refetched. Also owns the background
//! maintenance tasks started by the runtime.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use dioxus::core::ReactiveContext;
use tokio::task::JoinHandle;

use crate::key::QueryKey;

#[derive(Clone, Default)]
pub struct RefreshRegistry {
    refresh_counters: Arc<Mutex<HashMap<String, u32>>>,
    subscribers: Arc<Mutex<HashMap<String, HashSet<ReactiveContext>>>>,
    periodic_tasks: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl RefreshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-run `reactive_context` whenever `key` is refreshed
    pub fn subscribe_to_refresh(&self, key: &str, reactive_context: ReactiveContext) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers
                .entry(key.to_string())
                .or_default()
                .insert(reactive_context);
        }
    }

    /// How many times `key` has been refreshed since it was first seen
    pub fn get_refresh_count(&self, key: &str) -> u32 {
        self.refresh_counters
            .lock()
            .map(|counters| counters.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Bumps the refresh counter for `key` and marks its subscribers dirty
    pub fn trigger_refresh(&self, key: &str) {
        if let Ok(mut counters) = self.refresh_counters.lock() {
            *counters.entry(key.to_string()).or_insert(0) += 1;
        }

        let contexts: Vec<ReactiveContext> = self
            .subscribers
            .lock()
            .map(|subscribers| {
                subscribers
                    .get(key)
                    .map(|set| set.iter().copied().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default();

        // Contexts whose owner is gone refuse the dirty mark; prune them.
        let dead: Vec<ReactiveContext> = contexts
            .into_iter()
            .filter(|ctx| !ctx.mark_dirty())
            .collect();
        if !dead.is_empty()
            && let Ok(mut subscribers) = self.subscribers.lock()
            && let Some(set) = subscribers.get_mut(key)
        {
            for ctx in dead {
                set.remove(&ctx);
            }
        }
    }

    /// Refreshes every known key of `resource` plus the given extra keys
    pub fn trigger_resource_refresh(&self, resource: &str, extra_keys: &[String]) {
        let mut keys: HashSet<String> = extra_keys.iter().cloned().collect();
        if let Ok(subscribers) = self.subscribers.lock() {
            keys.extend(
                subscribers
                    .keys()
                    .filter(|k| QueryKey::resource_of(k) == resource)
                    .cloned(),
            );
        }
        for key in keys {
            self.trigger_refresh(&key);
        }
    }

    /// Forgets every subscriber of `key` (used when the last hook unmounts)
    pub fn remove_subscribers(&self, key: &str) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.remove(key);
        }
    }

    /// Wakes every subscriber of every key and resets counters
    pub fn clear_all(&self) {
        let keys: Vec<String> = self
            .subscribers
            .lock()
            .map(|subscribers| subscribers.keys().cloned().collect())
            .unwrap_or_default();
        for key in &keys {
            self.trigger_refresh(key);
        }
        if let Ok(mut counters) = self.refresh_counters.lock() {
            counters.clear();
        }
    }

    /// Runs `task` every `interval` on the ambient tokio runtime.
    ///
    /// Replaces a task already registered under `name`. Without a tokio runtime
    /// nothing is scheduled and `false` is returned.
    pub fn start_periodic_task<F>(&self, name: &str, interval: Duration, task: F) -> bool
    where
        F: Fn() + Send + 'static,
    {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            crate::warn_log!(
                "⚠️ [PERIODIC] No tokio runtime available, '{}' not scheduled",
                name
            );
            return false;
        };

        let join = handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                task();
            }
        });

        if let Ok(mut tasks) = self.periodic_tasks.lock()
            && let Some(previous) = tasks.insert(name.to_string(), join)
        {
            previous.abort();
        }
        crate::debug_log!(
            "⏱️ [PERIODIC] Started '{}' every {:?}",
            name,
            interval
        );
        true
    }

    pub fn stop_periodic_task(&self, name: &str) {
        if let Ok(mut tasks) = self.periodic_tasks.lock()
            && let Some(join) = tasks.remove(name)
        {
            join.abort();
        }
    }

    pub fn is_periodic_task_running(&self, name: &str) -> bool {
        self.periodic_tasks
            .lock()
            .map(|tasks| tasks.get(name).is_some_and(|join| !join.is_finished()))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn refresh_counts_are_per_key() {
        let registry = RefreshRegistry::new();
        registry.trigger_refresh("users");
        registry.trigger_refresh("users");
        registry.trigger_refresh("bookings");
        assert_eq!(registry.get_refresh_count("users"), 2);
        assert_eq!(registry.get_refresh_count("bookings"), 1);
        assert_eq!(registry.get_refresh_count("services"), 0);
    }

    #[test]
    fn resource_refresh_covers_extra_keys() {
        let registry = RefreshRegistry::new();
        registry.trigger_resource_refresh("users", &["users".into(), "users/3".into()]);
        assert_eq!(registry.get_refresh_count("users"), 1);
        assert_eq!(registry.get_refresh_count("users/3"), 1);
        assert_eq!(registry.get_refresh_count("bookings"), 0);
    }

    #[tokio::test]
    async fn periodic_task_runs_until_stopped() {
        let registry = RefreshRegistry::new();
        let runs = Arc::new(AtomicU32::new(0));
        let counter = runs.clone();
        assert!(registry.start_periodic_task("gc", Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(registry.is_periodic_task_running("gc"));
        registry.stop_periodic_task("gc");
        let after_stop = runs.load(Ordering::SeqCst);
        assert!(after_stop >= 1);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(runs.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn periodic_task_needs_runtime() {
        let registry = RefreshRegistry::new();
        assert!(!registry.start_periodic_task("gc", Duration::from_secs(1), || {}));
    }
}
