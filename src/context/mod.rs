//! App-wide contexts: the API handles, the session, site content and toasts
//!
//! Each context splits into a framework independent service and a thin Dioxus
//! wrapper installed with a `use_*_provider` hook near the root of the app.

pub mod auth;
pub mod content;
pub mod notification;

use dioxus::prelude::*;

use crate::api::MarketplaceApi;

pub use auth::{AuthContext, AuthService, SessionState, use_auth, use_auth_provider};
pub use content::{ContentContext, ContentService, SiteContent, use_content, use_content_provider};
pub use notification::{
    Notification, NotificationAction, NotificationCenter, NotificationContext, NotificationKind,
    use_notification_provider, use_notifications,
};

/// Make `api` available to [`use_api`] in every descendant
pub fn use_api_provider(api: MarketplaceApi) -> MarketplaceApi {
    use_context_provider(move || api)
}

/// The API handles installed by [`use_api_provider`]
pub fn use_api() -> MarketplaceApi {
    use_context()
}
