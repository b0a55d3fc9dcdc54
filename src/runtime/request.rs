//! Request orchestration helpers for use_query.

use std::{cell::RefCell, rc::Rc};

use dioxus::prelude::*;

use crate::{
    cache::{FetchOutcome, FetchTicket},
    hooks::query::Query,
    runtime::QueryRuntime,
    state::State,
    types::QueryParamBounds,
};

/// Ownership of the in-flight slot for one key.
///
/// If the fetching task is cancelled (its component unmounted) the slot is given
/// back and the key's other readers are woken so one of them can take over.
struct PendingFetch {
    runtime: QueryRuntime,
    cache_key: String,
    ticket: FetchTicket,
    settled: bool,
}

impl PendingFetch {
    fn new(runtime: QueryRuntime, cache_key: String, ticket: FetchTicket) -> Self {
        Self {
            runtime,
            cache_key,
            ticket,
            settled: false,
        }
    }

    fn settle(&mut self) {
        self.settled = true;
    }
}

impl Drop for PendingFetch {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if self
            .runtime
            .cache()
            .abandon_fetch(&self.cache_key, self.ticket)
        {
            crate::debug_log!(
                "🛑 [REQUEST-DEDUP] Fetch cancelled for key: {}, handing over",
                self.cache_key
            );
            self.runtime
                .refresh_registry()
                .trigger_refresh(&self.cache_key);
        }
    }
}

/// Cache miss orchestration that handles pending-request dedupe, silent refetch
/// after invalidation, and the primary async execution.
///
/// A hook already showing data for `cache_key` keeps it while the refetch runs;
/// any other hook, including one whose key just changed, moves to `Loading`. Only
/// the hook that wins the in-flight slot runs the query, the rest are woken when
/// the result is stored. The result is written to `state` only while `reading`
/// still holds `cache_key`.
pub fn handle_cache_miss<Q, Param>(
    runtime: &QueryRuntime,
    query: Q,
    param: Param,
    cache_key: String,
    mut state: Signal<State<Q::Output, Q::Error>>,
    reading: Rc<RefCell<Option<String>>>,
    key_changed: bool,
) where
    Q: Query<Param>,
    Param: QueryParamBounds,
{
    let Some(ticket) = runtime.cache().begin_fetch(&cache_key) else {
        if key_changed || matches!(*state.peek(), State::Idle | State::Error(_)) {
            state.set(State::Loading {
                task: spawn(async {}),
            });
        }
        return;
    };

    let silent = !key_changed && state.peek().is_success();
    if silent {
        crate::debug_log!(
            "🔄 [INVALIDATION] Refetching {} in the background, serving previous data",
            cache_key
        );
    }

    let mut pending = PendingFetch::new(runtime.clone(), cache_key.clone(), ticket);
    let runtime = runtime.clone();

    let task = spawn(async move {
        let result = query.run(param).await;
        pending.settle();

        match runtime
            .cache()
            .complete_fetch(&cache_key, ticket, result.clone())
        {
            FetchOutcome::Stored { changed } => {
                crate::log_cache_store!(
                    "Fetched {} (changed: {}, ok: {})",
                    cache_key,
                    changed,
                    result.is_ok()
                );
                if reading.borrow().as_deref() == Some(cache_key.as_str()) {
                    state.set(State::from_result(result));
                } else {
                    crate::debug_log!(
                        "⏭️ [REQUEST] Reader moved off {}, result cached only",
                        cache_key
                    );
                }
                runtime.refresh_registry().trigger_refresh(&cache_key);
            }
            FetchOutcome::Superseded => {
                crate::debug_log!(
                    "⏭️ [INVALIDATION] Result for {} arrived after invalidation, discarded",
                    cache_key
                );
            }
        }
    });

    if !silent {
        state.set(State::Loading { task });
    }
}
