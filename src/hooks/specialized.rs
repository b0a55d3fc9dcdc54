//! Parameterized reads (search, analytics) and the admin CMS screens
//!
//! Each is a [`Query`] whose parameters are part of the key, so they get the same
//! caching, deduplication and cancellation as the resource hooks.

use std::future::Future;

use serde_json::Value;

use crate::{
    api::{
        AdminAnnouncementsApi, AdminContentApi, ContentApi, Payload, Period, ResourceApi,
        SearchFilters, entities::Professional,
    },
    context::use_api,
    errors::{ClientError, ClientResult},
    global::get_global_runtime,
    hooks::{
        query::{Query, QueryHandle, use_query},
        resource::{ResourceHooks, UpdateInput},
    },
    key::{Filters, QueryKey},
};

/// `GET /professionals/search`, key `professionals/search?{filters}`
///
/// Lives under the `professionals` resource so professional mutations refresh
/// open searches too.
#[derive(Clone, PartialEq)]
pub struct ProfessionalSearchQuery {
    api: ContentApi,
}

impl ProfessionalSearchQuery {
    pub fn new(api: ContentApi) -> Self {
        Self { api }
    }
}

impl Query<Filters> for ProfessionalSearchQuery {
    type Output = Vec<Professional>;
    type Error = ClientError;

    fn key(&self, filters: &Filters) -> QueryKey {
        QueryKey::item("professionals", "search").with_params(filters.clone())
    }

    fn run(&self, filters: Filters) -> impl Future<Output = Result<Self::Output, Self::Error>> {
        let api = self.api.clone();
        async move { api.search_professionals(filters).await }
    }
}

/// `GET /analytics?period=`, key `analytics?period={period}`
#[derive(Clone, PartialEq)]
pub struct AnalyticsQuery {
    api: ContentApi,
}

impl AnalyticsQuery {
    pub fn new(api: ContentApi) -> Self {
        Self { api }
    }
}

impl Query<Period> for AnalyticsQuery {
    type Output = Value;
    type Error = ClientError;

    fn key(&self, period: &Period) -> QueryKey {
        QueryKey::list("analytics").with_params(period.to_filters())
    }

    fn run(&self, period: Period) -> impl Future<Output = Result<Value, ClientError>> {
        let api = self.api.clone();
        async move { api.analytics(period).await }
    }
}

/// Professionals matching `filters`; refetches whenever the filters change
pub fn use_professional_search(filters: SearchFilters) -> QueryHandle<Vec<Professional>, ClientError> {
    let api = use_api();
    use_query(
        ProfessionalSearchQuery::new(api.content),
        Some(filters.to_filters()),
    )
}

/// Dashboard figures for `period`
pub fn use_analytics(period: Period) -> QueryHandle<Value, ClientError> {
    let api = use_api();
    use_query(AnalyticsQuery::new(api.content), Some(period))
}

/// Create/update/remove for an admin list
///
/// Failures are logged and returned to the caller so the form can keep its
/// modal open; on success the list is refetched.
#[derive(Clone, PartialEq)]
pub struct AdminActions<A: ResourceApi> {
    api: A,
}

impl<A: ResourceApi> AdminActions<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    fn refetch_list(&self) {
        if let Ok(runtime) = get_global_runtime() {
            runtime.invalidate(&QueryKey::list(self.api.key()));
        }
    }

    fn report<T>(&self, action: &str, result: ClientResult<T>) -> ClientResult<T> {
        match result {
            Ok(value) => {
                self.refetch_list();
                Ok(value)
            }
            Err(error) => {
                crate::error_log!(
                    resource = self.api.key(),
                    error = %error,
                    "Failed to {} admin entry",
                    action
                );
                Err(error)
            }
        }
    }

    pub async fn create(&self, data: Payload) -> ClientResult<A::Item> {
        let result = self.api.create(data).await;
        self.report("create", result)
    }

    pub async fn update(&self, input: UpdateInput) -> ClientResult<A::Item> {
        let result = self.api.update(input.id, input.data).await;
        self.report("update", result)
    }

    pub async fn remove(&self, id: impl Into<crate::api::EntityId>) -> ClientResult<()> {
        let result = self.api.remove(id.into()).await;
        self.report("delete", result)
    }
}

pub type AdminContentActions = AdminActions<AdminContentApi>;
pub type AdminAnnouncementActions = AdminActions<AdminAnnouncementsApi>;

/// An admin list with its actions
pub struct AdminList<A: ResourceApi> {
    pub list: QueryHandle<Vec<A::Item>, ClientError>,
    pub actions: AdminActions<A>,
}

/// Admin view over `resource`
pub fn use_admin_list<A: ResourceApi>(api: A) -> AdminList<A> {
    let list = ResourceHooks::new(api.clone()).use_list();
    AdminList {
        list,
        actions: AdminActions::new(api),
    }
}

/// `/admin/content` blocks
pub fn use_admin_content() -> AdminList<AdminContentApi> {
    let api = use_api();
    use_admin_list(api.admin_content)
}

/// `/admin/announcements`
pub fn use_admin_announcements() -> AdminList<AdminAnnouncementsApi> {
    let api = use_api();
    use_admin_list(api.admin_announcements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ClientConfig, http::HttpClient};

    fn content_api() -> ContentApi {
        ContentApi::new(HttpClient::new(ClientConfig::default()).unwrap())
    }

    #[test]
    fn search_keys_are_deterministic_and_scoped() {
        let query = ProfessionalSearchQuery::new(content_api());
        let a = SearchFilters {
            category: Some("plumbing".into()),
            ..SearchFilters::text("leak")
        };
        let b = a.clone();
        assert_eq!(query.key(&a.to_filters()), query.key(&b.to_filters()));

        let key = query.key(&a.to_filters());
        assert_eq!(key.cache_key(), "professionals/search?category=plumbing&q=leak");
        assert!(key.matches_resource("professionals"));
        assert_ne!(
            key,
            query.key(&SearchFilters::text("boiler").to_filters())
        );
    }

    #[test]
    fn analytics_key_carries_period() {
        let query = AnalyticsQuery::new(content_api());
        assert_eq!(query.key(&Period::Month).cache_key(), "analytics?period=month");
        assert_ne!(query.key(&Period::Month), query.key(&Period::Week));
    }
}
