//! Site content and feature flags
//!
//! Loaded once at startup. A failing endpoint never blocks the others: its value
//! falls back to empty and the failure is logged.

use dioxus::prelude::*;

use crate::api::{
    ContentApi,
    content::{ContentMap, FeatureFlags},
    entities::Announcement,
};

/// Everything the content endpoints returned
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SiteContent {
    pub content: ContentMap,
    pub announcements: Vec<Announcement>,
    pub features: FeatureFlags,
}

impl SiteContent {
    /// The text for `key`, or `fallback` when the backend has none
    pub fn get_content(&self, key: &str, fallback: &str) -> String {
        self.content
            .get(key)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Unknown features are disabled
    pub fn is_feature_enabled(&self, id: &str) -> bool {
        self.features.get(id).copied().unwrap_or(false)
    }
}

#[derive(Clone, PartialEq)]
pub struct ContentService {
    api: ContentApi,
}

impl ContentService {
    pub fn new(api: ContentApi) -> Self {
        Self { api }
    }

    /// Fetches content, announcements and features concurrently
    pub async fn load(&self) -> SiteContent {
        let (content, announcements, features) = futures::join!(
            self.api.content(),
            self.api.announcements(),
            self.api.features()
        );

        SiteContent {
            content: content.unwrap_or_else(|e| {
                crate::warn_log!("⚠️ [CONTENT] Failed to load content: {}", e);
                ContentMap::new()
            }),
            announcements: announcements.unwrap_or_else(|e| {
                crate::warn_log!("⚠️ [CONTENT] Failed to load announcements: {}", e);
                Vec::new()
            }),
            features: features.unwrap_or_else(|e| {
                crate::warn_log!("⚠️ [CONTENT] Failed to load features: {}", e);
                FeatureFlags::new()
            }),
        }
    }
}

/// Site content as seen by components
#[derive(Clone, Copy)]
pub struct ContentContext {
    site: Signal<SiteContent>,
    loading: Signal<bool>,
}

impl ContentContext {
    pub fn site(&self) -> SiteContent {
        self.site.read().clone()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.read()
    }

    pub fn get_content(&self, key: &str, fallback: &str) -> String {
        self.site.read().get_content(key, fallback)
    }

    pub fn is_feature_enabled(&self, id: &str) -> bool {
        self.site.read().is_feature_enabled(id)
    }

    pub fn announcements(&self) -> Vec<Announcement> {
        self.site.read().announcements.clone()
    }
}

/// Install site content for the component tree and start loading it
pub fn use_content_provider(service: ContentService) -> ContentContext {
    let context = use_context_provider(|| ContentContext {
        site: Signal::new(SiteContent::default()),
        loading: Signal::new(true),
    });

    use_hook(move || {
        let mut site = context.site;
        let mut loading = context.loading;
        spawn(async move {
            let loaded = service.load().await;
            site.set(loaded);
            loading.set(false);
        })
    });

    context
}

/// The site content installed by [`use_content_provider`]
pub fn use_content() -> ContentContext {
    use_context()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ClientConfig, http::HttpClient};
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn getters_fall_back() {
        let mut site = SiteContent::default();
        site.content
            .insert("home.title".into(), "Book local pros".into());
        site.features.insert("chat".into(), true);
        site.features.insert("voice".into(), false);

        assert_eq!(site.get_content("home.title", "Welcome"), "Book local pros");
        assert_eq!(site.get_content("home.subtitle", "Welcome"), "Welcome");
        assert!(site.is_feature_enabled("chat"));
        assert!(!site.is_feature_enabled("voice"));
        assert!(!site.is_feature_enabled("video"));
    }

    #[tokio::test]
    async fn one_failing_endpoint_does_not_block_the_others() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/content");
                then.status(200).json_body(json!({"footer": "© Marketplace"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/announcements");
                then.status(500).json_body(json!({"message": "boom"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/features");
                then.status(200).json_body(json!({"reviews": true}));
            })
            .await;

        let client =
            HttpClient::new(ClientConfig::default().with_base_url(server.base_url())).unwrap();
        let site = ContentService::new(ContentApi::new(client)).load().await;

        assert_eq!(site.get_content("footer", ""), "© Marketplace");
        assert!(site.announcements.is_empty());
        assert!(site.is_feature_enabled("reviews"));
    }
}
