//! # Mutations
//!
//! Writes tracked with their own `Idle | Loading | Success | Error` state. A
//! mutation never writes into the query cache: once the server has acknowledged
//! the write, the keys it names in [`Mutation::invalidates`] are invalidated and
//! their readers refetch. Invalidation happens before the state turns `Success`
//! and before [`MutationHandle::mutate_async`] resolves.

use std::{future::Future, marker::PhantomData};

use dioxus::{core::spawn_forever, prelude::*};

use crate::{
    global::get_global_runtime,
    key::QueryKey,
    runtime::QueryRuntime,
    state::AsyncState,
    types::{QueryErrorBounds, QueryOutputBounds},
};

/// Cache targets to invalidate after a successful mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// One key
    Key(QueryKey),
    /// Every key of a resource: its list, items and parameterized lists
    Resource(String),
}

impl Invalidation {
    pub fn resource(resource: impl Into<String>) -> Self {
        Invalidation::Resource(resource.into())
    }

    /// Apply to `runtime`
    pub fn apply(&self, runtime: &QueryRuntime) {
        match self {
            Invalidation::Key(key) => runtime.invalidate(key),
            Invalidation::Resource(resource) => runtime.invalidate_resource(resource),
        }
    }
}

/// An async write and the cache keys it makes stale
pub trait Mutation<Input: 'static>: Clone + 'static {
    /// The type of data returned on success
    type Output: QueryOutputBounds;
    /// The type of error returned on failure
    type Error: QueryErrorBounds + std::fmt::Display;

    /// Name used in logs
    fn name(&self) -> String {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("mutation")
            .to_string()
    }

    /// Execute the write
    fn mutate(&self, input: Input) -> impl Future<Output = Result<Self::Output, Self::Error>>;

    /// Keys to invalidate once `output` has been acknowledged
    ///
    /// Computed from the result rather than the input so server-normalized ids
    /// address the right cache entries.
    fn invalidates(&self, output: &Self::Output) -> Vec<Invalidation> {
        let _ = output;
        Vec::new()
    }
}

/// Represents the state of a mutation
#[derive(Clone, PartialEq, Debug)]
pub enum MutationState<T, E> {
    /// The mutation has not been run, or was reset
    Idle,
    /// The mutation is in progress
    Loading,
    /// The mutation completed successfully
    Success(T),
    /// The mutation failed
    Error(E),
}

impl<T, E> AsyncState for MutationState<T, E> {
    type Data = T;
    type Error = E;

    fn is_loading(&self) -> bool {
        matches!(self, MutationState::Loading)
    }

    fn is_success(&self) -> bool {
        matches!(self, MutationState::Success(_))
    }

    fn is_error(&self) -> bool {
        matches!(self, MutationState::Error(_))
    }

    fn data(&self) -> Option<&T> {
        match self {
            MutationState::Success(data) => Some(data),
            _ => None,
        }
    }

    fn error(&self) -> Option<&E> {
        match self {
            MutationState::Error(error) => Some(error),
            _ => None,
        }
    }
}

impl<T, E> MutationState<T, E> {
    pub fn is_idle(&self) -> bool {
        matches!(self, MutationState::Idle)
    }
}

/// Runs `mutation` and records its progress in `state`.
///
/// Framework independent apart from the signal, so actions outside hooks can reuse it.
pub async fn execute_mutation<M, Input>(
    mutation: &M,
    input: Input,
    state: Signal<MutationState<M::Output, M::Error>>,
) -> Result<M::Output, M::Error>
where
    M: Mutation<Input>,
    Input: 'static,
{
    let name = mutation.name();
    crate::log_mutation_start!("Starting mutation: {}", name);
    record(state, MutationState::Loading);

    let result = mutation.mutate(input).await;
    match &result {
        Ok(output) => {
            invalidate_after(mutation, output);
            crate::log_mutation_success!("Mutation succeeded: {}", name);
            record(state, MutationState::Success(output.clone()));
        }
        Err(error) => {
            crate::log_mutation_error!("Mutation failed: {} ({})", name, error);
            record(state, MutationState::Error(error.clone()));
        }
    }
    result
}

/// Writes `next` unless the component owning `state` has unmounted
fn record<T: 'static, E: 'static>(
    mut state: Signal<MutationState<T, E>>,
    next: MutationState<T, E>,
) {
    match state.try_write() {
        Ok(mut slot) => *slot = next,
        Err(_) => {
            crate::debug_log!("🔄 [MUTATION] Owner unmounted, state not recorded");
        }
    }
}

/// Applies the invalidations `mutation` declares for `output` to the global runtime.
pub fn invalidate_after<M, Input>(mutation: &M, output: &M::Output)
where
    M: Mutation<Input>,
    Input: 'static,
{
    let Ok(runtime) = get_global_runtime() else {
        crate::warn_log!("⚠️ [MUTATION] Runtime not initialized, nothing to invalidate");
        return;
    };
    for target in mutation.invalidates(output) {
        crate::log_cache_invalidate!("{} invalidates {:?}", mutation.name(), target);
        target.apply(runtime);
    }
}

/// What a mutation hook hands back to the component
pub struct MutationHandle<M, Input>
where
    M: Mutation<Input>,
    Input: 'static,
{
    mutation: M,
    state: Signal<MutationState<M::Output, M::Error>>,
    _input: PhantomData<fn(Input)>,
}

impl<M, Input> Clone for MutationHandle<M, Input>
where
    M: Mutation<Input>,
    Input: 'static,
{
    fn clone(&self) -> Self {
        Self {
            mutation: self.mutation.clone(),
            state: self.state,
            _input: PhantomData,
        }
    }
}

impl<M, Input> MutationHandle<M, Input>
where
    M: Mutation<Input>,
    Input: 'static,
{
    /// Fire and forget; the outcome lands in the handle's state
    ///
    /// The write and its invalidations run to completion even if the calling
    /// component unmounts first, as when a form closes on submit.
    pub fn mutate(&self, input: Input) {
        let handle = self.clone();
        spawn_forever(async move {
            let _ = handle.mutate_async(input).await;
        });
    }

    /// Run and hand the result back to the caller
    pub async fn mutate_async(&self, input: Input) -> Result<M::Output, M::Error> {
        execute_mutation(&self.mutation, input, self.state).await
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading()
    }

    pub fn error(&self) -> Option<M::Error> {
        self.state.read().error().cloned()
    }

    pub fn data(&self) -> Option<M::Output> {
        self.state.read().data().cloned()
    }

    pub fn state(&self) -> MutationState<M::Output, M::Error> {
        self.state.read().clone()
    }

    pub fn signal(&self) -> Signal<MutationState<M::Output, M::Error>> {
        self.state
    }

    /// Back to `Idle`
    pub fn reset(&self) {
        let mut state = self.state;
        state.set(MutationState::Idle);
    }
}

/// Hook for running `mutation` from a component
pub fn use_mutation<M, Input>(mutation: M) -> MutationHandle<M, Input>
where
    M: Mutation<Input>,
    Input: 'static,
{
    let state = use_signal(|| MutationState::Idle);
    MutationHandle {
        mutation,
        state,
        _input: PhantomData,
    }
}
