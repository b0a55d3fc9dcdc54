//! # marketplace-provider
//!
//! Client data layer for the service marketplace, built for Dioxus.
//!
//! - [`http::HttpClient`] talks to the REST backend and normalizes its two
//!   response envelopes.
//! - [`api`] exposes one typed module per resource plus auth and site content.
//! - [`hooks`] caches reads under canonical [`key::QueryKey`]s, deduplicates
//!   concurrent fetches and refetches readers when a mutation invalidates them.
//! - [`context`] holds the session, site content and toast notifications.
//!
//! ```rust,no_run
//! use dioxus::prelude::*;
//! use marketplace_provider::prelude::*;
//!
//! // Once, before the app is launched
//! let config = ClientConfig::from_env().unwrap();
//! ProviderConfig::from_client_config(&config).init().unwrap();
//!
//! #[component]
//! fn App() -> Element {
//!     let config = use_hook(|| ClientConfig::from_env().unwrap());
//!     let token = use_hook(SessionToken::new);
//!     let api = use_hook(|| {
//!         let client = HttpClient::new(config.clone()).unwrap();
//!         MarketplaceApi::new(client)
//!     });
//!     let storage = use_hook(|| FileStorage::from_config(config.storage_path.as_deref()).unwrap());
//!
//!     use_api_provider(api.clone());
//!     use_auth_provider(AuthService::new(
//!         api.auth.clone(),
//!         std::sync::Arc::new(storage),
//!         token,
//!     ));
//!     rsx! {}
//! }
//! ```

// Data access
pub mod api;
pub mod config;
pub mod envelope;
pub mod errors;
pub mod http;
pub mod key;
pub mod storage;

// Query runtime
pub mod cache;
pub mod global;
pub mod hooks;
mod log_utils;
pub mod refresh;
pub mod runtime;
pub mod state;
pub mod types;

// App-wide contexts
pub mod context;

pub use global::ProviderConfig;
pub use global::init;

pub mod prelude {
    //! The prelude exports the types and hooks most screens need.

    // Configuration and global initialization
    pub use crate::config::{ClientConfig, RetryConfig};
    pub use crate::global::{ProviderConfig, init};

    // Transport and API modules
    pub use crate::api::{
        AuthApi, BookingsApi, CategoriesApi, ContentApi, Credentials, EntityId, HasId,
        LocationsApi, MarketplaceApi, Payload, Period, ProfessionalsApi, RegisterPayload,
        ResourceApi, SearchFilters, ServicesApi, UsersApi,
    };
    pub use crate::api::entities::{
        Announcement, Booking, Category, Content, Location, Professional, Service, User,
    };
    pub use crate::http::{HttpClient, SessionToken};
    pub use crate::key::{Filters, QueryKey};
    pub use crate::storage::{FileStorage, MemoryStorage, Storage};

    // Queries and mutations
    pub use crate::hooks::{
        Invalidation, Mutation, MutationHandle, Query, QueryHandle, ResourceHooks, UpdateInput,
        use_admin_announcements, use_admin_content, use_analytics, use_clear_query_cache,
        use_invalidate_query, use_mutation, use_professional_search, use_query, use_query_cache,
    };

    // State enums, needed for matching
    pub use crate::hooks::MutationState;
    pub use crate::state::{AsyncState, State};

    // Contexts
    pub use crate::context::{
        AuthContext, AuthService, ContentService, NotificationKind, use_api, use_api_provider,
        use_auth, use_auth_provider, use_content, use_content_provider,
        use_notification_provider, use_notifications,
    };

    // Errors
    pub use crate::errors::{ClientError, ClientResult};
}
