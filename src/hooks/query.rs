//! # Query Hooks
//!
//! [`use_query`] binds a [`Query`] to the global cache. All hooks reading the
//! same [`QueryKey`] share one cache entry and at most one in-flight request.
//! Requires [`init`](crate::global::init) to be called at application startup.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dioxus::prelude::*;
//! use marketplace_provider::prelude::*;
//!
//! #[derive(Clone, PartialEq)]
//! struct Greeting;
//!
//! impl Query<EntityId> for Greeting {
//!     type Output = String;
//!     type Error = ClientError;
//!
//!     fn key(&self, id: &EntityId) -> QueryKey {
//!         QueryKey::item("greetings", id)
//!     }
//!
//!     async fn run(&self, id: EntityId) -> Result<String, ClientError> {
//!         Ok(format!("Hello {id}"))
//!     }
//! }
//!
//! #[component]
//! fn Greeter(id: Option<i64>) -> Element {
//!     let greeting = use_query(Greeting, id.map(EntityId::from)).data();
//!     rsx! { "{greeting:?}" }
//! }
//! ```

use std::{cell::RefCell, future::Future, rc::Rc};

use dioxus::{core::ReactiveContext, prelude::*};

use crate::{
    cache::QueryCache,
    global::get_global_runtime,
    key::QueryKey,
    runtime::{QueryRuntime, request::handle_cache_miss},
    state::State,
    types::{QueryErrorBounds, QueryOutputBounds, QueryParamBounds},
};

/// An async read addressed by a [`QueryKey`]
///
/// Use `Query<()>` for queries without parameters.
pub trait Query<Param = ()>: Clone + PartialEq + 'static
where
    Param: QueryParamBounds,
{
    /// The type of data returned on success
    type Output: QueryOutputBounds;
    /// The type of error returned on failure
    type Error: QueryErrorBounds;

    /// Cache key for `param`; equal params must produce equal keys
    fn key(&self, param: &Param) -> QueryKey;

    /// Execute the read
    fn run(&self, param: Param) -> impl Future<Output = Result<Self::Output, Self::Error>>;
}

/// What a query hook hands back to the component
pub struct QueryHandle<T: 'static, E: 'static> {
    state: Signal<State<T, E>>,
    key: Option<QueryKey>,
}

impl<T, E> Clone for QueryHandle<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            key: self.key.clone(),
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> QueryHandle<T, E> {
    /// The last successful result
    pub fn data(&self) -> Option<T> {
        self.state.read().data().cloned()
    }

    /// True while the first fetch (or a fetch after an error) is running
    ///
    /// A refetch behind already loaded data is silent; see [`is_fetching`](Self::is_fetching).
    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading()
    }

    /// True while any request for this key is in flight
    pub fn is_fetching(&self) -> bool {
        let pending = match (&self.key, get_global_runtime()) {
            (Some(key), Ok(runtime)) => runtime.cache().is_request_pending(&key.cache_key()),
            _ => false,
        };
        pending || self.is_loading()
    }

    pub fn error(&self) -> Option<E> {
        self.state.read().error().cloned()
    }

    pub fn state(&self) -> State<T, E> {
        self.state.read().clone()
    }

    /// The underlying signal, for `match` in rsx
    pub fn signal(&self) -> Signal<State<T, E>> {
        self.state
    }

    /// `None` for a disabled query
    pub fn key(&self) -> Option<&QueryKey> {
        self.key.as_ref()
    }

    /// Invalidate this query's key so every reader refetches
    pub fn refetch(&self) {
        if let (Some(key), Ok(runtime)) = (&self.key, get_global_runtime()) {
            runtime.invalidate(key);
        }
    }
}

fn runtime_or_panic() -> QueryRuntime {
    get_global_runtime()
        .unwrap_or_else(|_| {
            panic!(
                "Global providers not initialized. Call marketplace_provider::init() before using query hooks."
            )
        })
        .clone()
}

/// Hook to access the query cache for manual cache management
pub fn use_query_cache() -> QueryCache {
    runtime_or_panic().cache().clone()
}

/// Hook returning a function that invalidates `key` and wakes its readers
pub fn use_invalidate_query(key: QueryKey) -> impl Fn() + Clone {
    let runtime = runtime_or_panic();
    move || runtime.invalidate(&key)
}

/// Hook returning a function that drops every cached result
pub fn use_clear_query_cache() -> impl Fn() + Clone {
    let runtime = runtime_or_panic();
    move || runtime.clear()
}

/// Moves this hook's reader registration to `next`, returning whether it moved.
fn track_reader(
    runtime: &QueryRuntime,
    current: &RefCell<Option<String>>,
    next: Option<&str>,
) -> bool {
    let mut current = current.borrow_mut();
    if current.as_deref() == next {
        return false;
    }
    if let Some(previous) = current.take() {
        runtime.release(&previous);
    }
    if let Some(next) = next {
        runtime.retain(next);
        *current = Some(next.to_string());
    }
    true
}

/// Drops the fetch this hook started for the key it no longer reads.
fn cancel_loading<T: 'static, E: 'static>(state: Signal<State<T, E>>) {
    let task = match *state.peek() {
        State::Loading { task } => Some(task),
        _ => None,
    };
    if let Some(task) = task {
        task.cancel();
    }
}

/// Reads `query` for `param`, fetching on mount and after every invalidation
///
/// With `param == None` the query is disabled: no request is made and the state
/// stays [`State::Idle`].
///
/// ## Behavior
///
/// - **Deduplication**: concurrent readers of one key share a single request
/// - **Silent refetch**: after invalidation, loaded data stays visible until the
///   new result arrives
/// - **Cancellation**: the request task belongs to the component that started it
///   and is dropped on unmount or when `param` moves to another key; another
///   reader of the key then takes over
/// - **Latest key wins**: a result only reaches the state if the hook still
///   reads the key it was fetched for
/// - **Retention**: the cache entry is kept while any hook reads it
pub fn use_query<Q, Param>(query: Q, param: Option<Param>) -> QueryHandle<Q::Output, Q::Error>
where
    Q: Query<Param>,
    Param: QueryParamBounds,
{
    let mut state = use_signal(|| State::Idle);
    let runtime = runtime_or_panic();
    let reading: Rc<RefCell<Option<String>>> = use_hook(|| Rc::new(RefCell::new(None)));

    {
        let reading = reading.clone();
        let runtime = runtime.clone();
        use_drop(move || {
            if let Some(key) = reading.borrow_mut().take() {
                runtime.release(&key);
            }
        });
    }

    let key = param.as_ref().map(|p| query.key(p));

    let runtime_for_memo = runtime.clone();
    let _execution_memo = use_memo(use_reactive!(|(query, param)| {
        let runtime = &runtime_for_memo;
        runtime.ensure_maintenance();

        let cache_key = param.as_ref().map(|p| query.key(p).cache_key());
        let key_changed = track_reader(runtime, &reading, cache_key.as_deref());
        if key_changed {
            cancel_loading(state);
        }

        let (Some(param), Some(cache_key)) = (param, cache_key) else {
            if !state.peek().is_idle() {
                state.set(State::Idle);
            }
            return;
        };

        // Subscribe to refresh events for this cache key
        if let Some(reactive_context) = ReactiveContext::current() {
            runtime
                .refresh_registry()
                .subscribe_to_refresh(&cache_key, reactive_context);
        }

        if let Some(cached) = runtime
            .cache()
            .get::<Result<Q::Output, Q::Error>>(&cache_key)
        {
            crate::log_cache_hit!("Serving {} from cache", cache_key);
            let next = State::from_result(cached);
            if *state.peek() != next {
                state.set(next);
            }
            return;
        }

        handle_cache_miss(
            runtime,
            query,
            param,
            cache_key,
            state,
            reading.clone(),
            key_changed,
        );
    }));

    QueryHandle { state, key }
}
