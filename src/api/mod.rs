//! Resource API modules
//!
//! One module per backend entity, each mapping `fetch_all / fetch_one / create /
//! update / remove` onto the REST conventions:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `fetch_all(filters)` | `GET /{resource}?filters` |
//! | `fetch_one(id)` | `GET /{resource}/{id}` |
//! | `create(data)` | `POST /{resource}` |
//! | `update(id, data)` | `PUT /{resource}/{id}` |
//! | `remove(id)` | `DELETE /{resource}/{id}` |
//!
//! Each call performs one request and unwraps the envelope declared for the
//! endpoint family. No caching and no validation happen here; errors propagate
//! unchanged.

pub mod auth;
pub mod content;
pub mod entities;
pub mod resources;

use std::{future::Future, marker::PhantomData};

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    envelope::{Envelope, select_field},
    errors::ClientResult,
    http::{HttpClient, RequestOptions},
    key::Filters,
};

pub use auth::{AuthApi, AuthResponse, Credentials, RegisterPayload};
pub use content::{ContentApi, Period, SearchFilters};
pub use entities::{EntityId, HasId};
pub use resources::*;

/// Body sent on create and update
pub type Payload = Value;

/// Static description of a REST resource
pub trait Resource: 'static {
    /// Record type returned by the endpoints
    type Item: DeserializeOwned + HasId + Clone + PartialEq + Send + Sync + 'static;

    /// Cache key namespace, e.g. `users`
    const KEY: &'static str;
    /// Base path, e.g. `/users`
    const PATH: &'static str;
    /// Envelope used by every endpoint of the resource
    const ENVELOPE: Envelope = Envelope::Bare;
    /// Field holding the array when the list payload is an object
    const LIST_FIELD: Option<&'static str> = None;
}

/// The five transport operations every resource exposes
///
/// Implemented over HTTP by [`RestResource`]; tests and previews can provide
/// their own implementation.
pub trait ResourceApi: Clone + PartialEq + 'static {
    type Item: HasId + Clone + PartialEq + Send + Sync + 'static;

    /// Cache key namespace
    fn key(&self) -> &'static str;

    fn fetch_all(
        &self,
        filters: Option<Filters>,
    ) -> impl Future<Output = ClientResult<Vec<Self::Item>>>;

    fn fetch_one(&self, id: EntityId) -> impl Future<Output = ClientResult<Self::Item>>;

    fn create(&self, data: Payload) -> impl Future<Output = ClientResult<Self::Item>>;

    fn update(
        &self,
        id: EntityId,
        data: Payload,
    ) -> impl Future<Output = ClientResult<Self::Item>>;

    fn remove(&self, id: EntityId) -> impl Future<Output = ClientResult<()>>;
}

/// Every resource API built over one shared HTTP client
#[derive(Clone)]
pub struct MarketplaceApi {
    pub users: UsersApi,
    pub professionals: ProfessionalsApi,
    pub services: ServicesApi,
    pub bookings: BookingsApi,
    pub categories: CategoriesApi,
    pub locations: LocationsApi,
    pub admin_content: AdminContentApi,
    pub admin_announcements: AdminAnnouncementsApi,
    pub auth: AuthApi,
    pub content: ContentApi,
}

impl MarketplaceApi {
    pub fn new(client: HttpClient) -> Self {
        Self {
            users: RestResource::new(client.clone()),
            professionals: RestResource::new(client.clone()),
            services: RestResource::new(client.clone()),
            bookings: RestResource::new(client.clone()),
            categories: RestResource::new(client.clone()),
            locations: RestResource::new(client.clone()),
            admin_content: RestResource::new(client.clone()),
            admin_announcements: RestResource::new(client.clone()),
            auth: AuthApi::new(client.clone()),
            content: ContentApi::new(client),
        }
    }
}

/// HTTP implementation of [`ResourceApi`] for a [`Resource`]
pub struct RestResource<R: Resource> {
    client: HttpClient,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> RestResource<R> {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    fn options(&self) -> RequestOptions {
        RequestOptions::new().with_envelope(R::ENVELOPE)
    }

    fn item_path(id: &EntityId) -> String {
        format!("{}/{}", R::PATH, id)
    }
}

impl<R: Resource> Clone for RestResource<R> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone())
    }
}

// Two handles for the same resource type address the same endpoints.
impl<R: Resource> PartialEq for RestResource<R> {
    fn eq(&self, other: &Self) -> bool {
        self.client.base_url() == other.client.base_url()
    }
}

impl<R: Resource> ResourceApi for RestResource<R> {
    type Item = R::Item;

    fn key(&self) -> &'static str {
        R::KEY
    }

    async fn fetch_all(&self, filters: Option<Filters>) -> ClientResult<Vec<R::Item>> {
        let mut options = self.options();
        if let Some(filters) = filters {
            options = options.with_query(filters);
        }
        let payload = self.client.get(R::PATH, options).await?;
        let list = match R::LIST_FIELD {
            Some(field) => select_field(payload, field)?,
            None => payload,
        };
        Ok(serde_json::from_value(list)?)
    }

    async fn fetch_one(&self, id: EntityId) -> ClientResult<R::Item> {
        self.client
            .request_as(Method::GET, &Self::item_path(&id), Option::<&()>::None, self.options())
            .await
    }

    async fn create(&self, data: Payload) -> ClientResult<R::Item> {
        self.client
            .request_as(Method::POST, R::PATH, Some(&data), self.options())
            .await
    }

    async fn update(&self, id: EntityId, data: Payload) -> ClientResult<R::Item> {
        self.client
            .request_as(Method::PUT, &Self::item_path(&id), Some(&data), self.options())
            .await
    }

    async fn remove(&self, id: EntityId) -> ClientResult<()> {
        self.client
            .delete(&Self::item_path(&id), self.options())
            .await
            .map(|_| ())
    }
}
