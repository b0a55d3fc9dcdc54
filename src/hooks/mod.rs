//! Query and mutation hooks for Dioxus applications

pub mod mutation;
pub mod query;
pub mod resource;
pub mod specialized;

pub use mutation::{Invalidation, Mutation, MutationHandle, MutationState, use_mutation};
pub use query::{
    Query, QueryHandle, use_clear_query_cache, use_invalidate_query, use_query, use_query_cache,
};
pub use resource::{ResourceHooks, UpdateInput};
pub use specialized::{
    AdminActions, AdminContentActions, AdminList, use_admin_announcements, use_admin_content,
    use_analytics, use_professional_search,
};
