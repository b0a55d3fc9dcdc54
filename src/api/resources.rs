//! Resource declarations for every backend entity

use crate::envelope::Envelope;

use super::{
    Resource, RestResource,
    entities::{Announcement, Booking, Category, Content, Location, Professional, Service, User},
};

macro_rules! resource {
    ($marker:ident, $api:ident, $item:ty, $key:literal, $path:literal) => {
        resource!($marker, $api, $item, $key, $path, Envelope::Bare, None);
    };
    ($marker:ident, $api:ident, $item:ty, $key:literal, $path:literal, $envelope:expr, $field:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $marker;

        impl Resource for $marker {
            type Item = $item;
            const KEY: &'static str = $key;
            const PATH: &'static str = $path;
            const ENVELOPE: Envelope = $envelope;
            const LIST_FIELD: Option<&'static str> = $field;
        }

        pub type $api = RestResource<$marker>;
    };
}

resource!(Users, UsersApi, User, "users", "/users");
resource!(Professionals, ProfessionalsApi, Professional, "professionals", "/professionals");
resource!(Services, ServicesApi, Service, "services", "/services");
resource!(Bookings, BookingsApi, Booking, "bookings", "/bookings");
resource!(Categories, CategoriesApi, Category, "categories", "/categories");
resource!(Locations, LocationsApi, Location, "locations", "/locations");
resource!(
    AdminContent,
    AdminContentApi,
    Content,
    "admin-content",
    "/admin/content",
    Envelope::Wrapped,
    Some("content")
);
resource!(
    AdminAnnouncements,
    AdminAnnouncementsApi,
    Announcement,
    "admin-announcements",
    "/admin/announcements",
    Envelope::Wrapped,
    Some("announcements")
);

#[cfg(test)]
mod tests {
    use crate::{
        api::{EntityId, MarketplaceApi, ResourceApi},
        config::ClientConfig,
        errors::ClientError,
        http::HttpClient,
    };
    use httpmock::prelude::*;
    use serde_json::json;

    fn api_for(server: &MockServer) -> MarketplaceApi {
        let client =
            HttpClient::new(ClientConfig::default().with_base_url(server.base_url())).unwrap();
        MarketplaceApi::new(client)
    }

    #[tokio::test]
    async fn bare_and_wrapped_lists_are_both_extracted() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/services");
                then.status(200)
                    .json_body(json!([{"id": 1, "title": "Deep clean"}, {"id": 2, "title": "Boiler fix"}]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/admin/content");
                then.status(200).json_body(json!({
                    "success": true,
                    "data": {
                        "content": [{"id": "hero", "key": "home.hero", "value": "Book a pro"}],
                        "categories": ["home", "footer"]
                    }
                }));
            })
            .await;

        let api = api_for(&server);
        let services = api.services.fetch_all(None).await.unwrap();
        assert_eq!(services.len(), 2);
        assert_eq!(services[1].get_str("title"), Some("Boiler fix"));

        let content = api.admin_content.fetch_all(None).await.unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0].id, EntityId::from("hero"));
        assert_eq!(content[0].get_str("key"), Some("home.hero"));
    }

    #[tokio::test]
    async fn crud_maps_to_rest_verbs() {
        let server = MockServer::start_async().await;
        let get_one = server
            .mock_async(|when, then| {
                when.method(GET).path("/bookings/12");
                then.status(200).json_body(json!({"id": 12, "status": "PENDING"}));
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/bookings")
                    .json_body(json!({"serviceId": 3}));
                then.status(201).json_body(json!({"id": 13, "serviceId": 3}));
            })
            .await;
        let update = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/bookings/12")
                    .json_body(json!({"status": "CONFIRMED"}));
                then.status(200).json_body(json!({"id": 12, "status": "CONFIRMED"}));
            })
            .await;
        let remove = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/bookings/12");
                then.status(204);
            })
            .await;

        let api = api_for(&server).bookings;
        let booking = api.fetch_one(EntityId::from(12)).await.unwrap();
        assert_eq!(booking.get_str("status"), Some("PENDING"));

        let created = api.create(json!({"serviceId": 3})).await.unwrap();
        assert_eq!(created.id, EntityId::Number(13));

        let updated = api
            .update(EntityId::from(12), json!({"status": "CONFIRMED"}))
            .await
            .unwrap();
        assert_eq!(updated.get_str("status"), Some("CONFIRMED"));

        api.remove(EntityId::from(12)).await.unwrap();

        get_one.assert_async().await;
        create.assert_async().await;
        update.assert_async().await;
        remove.assert_async().await;
    }

    #[tokio::test]
    async fn list_filters_become_query_params() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/professionals")
                    .query_param("category", "electrical");
                then.status(200).json_body(json!([]));
            })
            .await;

        let filters = crate::key::Filters::new().with("category", "electrical");
        let pros = api_for(&server)
            .professionals
            .fetch_all(Some(filters))
            .await
            .unwrap();
        assert!(pros.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn errors_propagate_unchanged() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/users/404");
                then.status(404).body("Not found");
            })
            .await;

        let err = api_for(&server)
            .users
            .fetch_one(EntityId::from(404))
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::api(404, "Not found"));
    }
}
