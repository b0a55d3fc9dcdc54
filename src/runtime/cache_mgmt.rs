//! Cache retention owned by the runtime.

use std::time::Duration;

use crate::{cache::QueryCache, refresh::RefreshRegistry};

/// Name of the periodic task that enforces retention
pub(crate) const MAINTENANCE_TASK: &str = "cache-maintenance";

/// Starts the periodic cleanup of the query cache.
///
/// 1. Entries with no subscribers that were not read within `retention` are dropped
/// 2. The cache is trimmed to `max_entries` by least recent access
///
/// Returns `false` when no tokio runtime is available to host the task.
pub fn setup_cache_maintenance(
    cache: &QueryCache,
    refresh_registry: &RefreshRegistry,
    retention: Duration,
    max_entries: usize,
) -> bool {
    let cleanup_interval = std::cmp::max(retention / 4, Duration::from_secs(30));
    let cache = cache.clone();

    let started = refresh_registry.start_periodic_task(MAINTENANCE_TASK, cleanup_interval, move || {
        let removed = cache.collect_garbage(retention);
        let evicted = cache.evict_lru_entries(max_entries);
        if removed + evicted > 0 {
            crate::debug_log!(
                "🧹 [SMART-CLEANUP] Removed {} unreferenced and {} excess cache entries",
                removed,
                evicted
            );
        }
    });

    if started {
        crate::debug_log!(
            "📊 [SMART-CACHE] Cache maintenance every {:?} (retention {:?}, max {} entries)",
            cleanup_interval,
            retention,
            max_entries
        );
    }
    started
}
