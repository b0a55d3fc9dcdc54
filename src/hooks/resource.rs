//! # Resource Hooks
//!
//! [`ResourceHooks`] turns any [`ResourceApi`] into the standard set of CRUD hooks:
//!
//! | Hook | Key | Invalidates on success |
//! |------|-----|------------------------|
//! | `use_list()` | `[key]` | |
//! | `use_list_with(filters)` | `[key, filters]` | |
//! | `use_item(id)` | `[key, id]` (disabled without an id) | |
//! | `use_create()` | | `[key]` |
//! | `use_update()` | | `[key]`, `[key, result.id]` |
//! | `use_delete()` | | `[key]` |
//!
//! Invalidating `[key]` reaches every key of the resource, so list, item and
//! filtered readers all refetch.

use std::future::Future;

use crate::{
    api::{EntityId, HasId, Payload, ResourceApi},
    errors::ClientError,
    hooks::{
        mutation::{Invalidation, Mutation, MutationHandle, use_mutation},
        query::{Query, QueryHandle, use_query},
    },
    key::{Filters, QueryKey},
};

/// Input of the update mutation
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateInput {
    pub id: EntityId,
    pub data: Payload,
}

impl UpdateInput {
    pub fn new(id: impl Into<EntityId>, data: Payload) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// `fetch_all` as a query; empty filters address the plain list key
#[derive(Clone, PartialEq)]
pub struct ListQuery<A: ResourceApi> {
    api: A,
}

impl<A: ResourceApi> Query<Filters> for ListQuery<A> {
    type Output = Vec<A::Item>;
    type Error = ClientError;

    fn key(&self, filters: &Filters) -> QueryKey {
        QueryKey::list(self.api.key()).with_params(filters.clone())
    }

    fn run(&self, filters: Filters) -> impl Future<Output = Result<Self::Output, Self::Error>> {
        let api = self.api.clone();
        async move {
            let filters = (!filters.is_empty()).then_some(filters);
            api.fetch_all(filters).await
        }
    }
}

/// `fetch_one` as a query
#[derive(Clone, PartialEq)]
pub struct ItemQuery<A: ResourceApi> {
    api: A,
}

impl<A: ResourceApi> Query<EntityId> for ItemQuery<A> {
    type Output = A::Item;
    type Error = ClientError;

    fn key(&self, id: &EntityId) -> QueryKey {
        QueryKey::item(self.api.key(), id)
    }

    fn run(&self, id: EntityId) -> impl Future<Output = Result<Self::Output, Self::Error>> {
        let api = self.api.clone();
        async move { api.fetch_one(id).await }
    }
}

#[derive(Clone, PartialEq)]
pub struct CreateMutation<A: ResourceApi> {
    api: A,
}

impl<A: ResourceApi> Mutation<Payload> for CreateMutation<A> {
    type Output = A::Item;
    type Error = ClientError;

    fn name(&self) -> String {
        format!("create {}", self.api.key())
    }

    fn mutate(&self, data: Payload) -> impl Future<Output = Result<Self::Output, Self::Error>> {
        let api = self.api.clone();
        async move { api.create(data).await }
    }

    fn invalidates(&self, _created: &A::Item) -> Vec<Invalidation> {
        vec![Invalidation::resource(self.api.key())]
    }
}

#[derive(Clone, PartialEq)]
pub struct UpdateMutation<A: ResourceApi> {
    api: A,
}

impl<A: ResourceApi> Mutation<UpdateInput> for UpdateMutation<A> {
    type Output = A::Item;
    type Error = ClientError;

    fn name(&self) -> String {
        format!("update {}", self.api.key())
    }

    fn mutate(
        &self,
        input: UpdateInput,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>> {
        let api = self.api.clone();
        async move { api.update(input.id, input.data).await }
    }

    fn invalidates(&self, updated: &A::Item) -> Vec<Invalidation> {
        vec![
            Invalidation::resource(self.api.key()),
            Invalidation::Key(QueryKey::item(self.api.key(), updated.id())),
        ]
    }
}

#[derive(Clone, PartialEq)]
pub struct DeleteMutation<A: ResourceApi> {
    api: A,
}

impl<A: ResourceApi> Mutation<EntityId> for DeleteMutation<A> {
    type Output = ();
    type Error = ClientError;

    fn name(&self) -> String {
        format!("delete {}", self.api.key())
    }

    fn mutate(&self, id: EntityId) -> impl Future<Output = Result<(), Self::Error>> {
        let api = self.api.clone();
        async move { api.remove(id).await }
    }

    fn invalidates(&self, _: &()) -> Vec<Invalidation> {
        vec![Invalidation::resource(self.api.key())]
    }
}

/// CRUD hooks for one resource
///
/// ```rust,ignore
/// use dioxus::prelude::*;
/// use marketplace_provider::prelude::*;
///
/// #[component]
/// fn Bookings(api: BookingsApi) -> Element {
///     let bookings = ResourceHooks::new(api);
///     let list = bookings.use_list();
///     let create = bookings.use_create();
///     let count = list.data().map(|items| items.len()).unwrap_or(0);
///
///     rsx! {
///         button {
///             onclick: move |_| create.mutate(serde_json::json!({"serviceId": 1})),
///             "Book ({count})"
///         }
///     }
/// }
/// ```
#[derive(Clone, PartialEq)]
pub struct ResourceHooks<A: ResourceApi> {
    api: A,
}

impl<A: ResourceApi> ResourceHooks<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Cache key namespace of the resource
    pub fn key(&self) -> &'static str {
        self.api.key()
    }

    /// Every record, key `[key]`
    pub fn use_list(&self) -> QueryHandle<Vec<A::Item>, ClientError> {
        self.use_list_with(Filters::new())
    }

    /// Records matching `filters`, key `[key, filters]`
    pub fn use_list_with(&self, filters: Filters) -> QueryHandle<Vec<A::Item>, ClientError> {
        use_query(ListQuery { api: self.api.clone() }, Some(filters))
    }

    /// One record, key `[key, id]`; without an id nothing is fetched
    pub fn use_item<I: Into<EntityId>>(
        &self,
        id: Option<I>,
    ) -> QueryHandle<A::Item, ClientError> {
        use_query(ItemQuery { api: self.api.clone() }, id.map(Into::into))
    }

    pub fn use_create(&self) -> MutationHandle<CreateMutation<A>, Payload> {
        use_mutation(CreateMutation { api: self.api.clone() })
    }

    pub fn use_update(&self) -> MutationHandle<UpdateMutation<A>, UpdateInput> {
        use_mutation(UpdateMutation { api: self.api.clone() })
    }

    pub fn use_delete(&self) -> MutationHandle<DeleteMutation<A>, EntityId> {
        use_mutation(DeleteMutation { api: self.api.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BookingsApi, RestResource};
    use crate::{config::ClientConfig, http::HttpClient};
    use serde_json::json;

    fn bookings() -> BookingsApi {
        RestResource::new(HttpClient::new(ClientConfig::default()).unwrap())
    }

    #[test]
    fn query_keys_follow_resource_layout() {
        let list = ListQuery { api: bookings() };
        assert_eq!(list.key(&Filters::new()).cache_key(), "bookings");
        assert_eq!(
            list.key(&Filters::new().with("status", "PENDING")).cache_key(),
            "bookings?status=PENDING"
        );

        let item = ItemQuery { api: bookings() };
        assert_eq!(item.key(&EntityId::from(5)), item.key(&EntityId::from(5)));
        assert_ne!(item.key(&EntityId::from(5)), item.key(&EntityId::from(6)));
        assert_eq!(item.key(&EntityId::from(5)).cache_key(), "bookings/5");
    }

    #[test]
    fn update_invalidates_list_and_returned_id() {
        let update = UpdateMutation { api: bookings() };
        // The server answered with a normalized id; the result wins over the input
        let updated = crate::api::entities::Booking::new("bk_5").with("status", json!("DONE"));
        assert_eq!(
            update.invalidates(&updated),
            vec![
                Invalidation::resource("bookings"),
                Invalidation::Key(QueryKey::item("bookings", "bk_5")),
            ]
        );
    }

    #[test]
    fn create_and_delete_invalidate_the_resource() {
        let create = CreateMutation { api: bookings() };
        let delete = DeleteMutation { api: bookings() };
        let created = crate::api::entities::Booking::new(9);
        assert_eq!(create.invalidates(&created), vec![Invalidation::resource("bookings")]);
        assert_eq!(delete.invalidates(&()), vec![Invalidation::resource("bookings")]);
        assert_eq!(delete.name(), "delete bookings");
    }
}
