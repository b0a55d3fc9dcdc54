//! Query keys
//!
//! A [`QueryKey`] addresses one cached result set: `(resource, id?, params?)`.
//! Keys render to a canonical string (`users`, `users/7`, `users?role=pro`,
//! `users/7?expand=bookings`) which is what the cache and the refresh registry
//! index on. Every key of a resource starts with the resource name, so
//! invalidating a resource reaches its list, item and parameterized entries.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Query-string filters for list endpoints
///
/// Backed by a `BTreeMap` so iteration order, and therefore the rendered key, is
/// independent of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filters(BTreeMap<String, String>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a filter; empty values are skipped so "no filter" never reaches the backend
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        let value = value.to_string();
        if !value.is_empty() {
            self.0.insert(key.into(), value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `a=1&b=2`, percent-encoded
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filters = Filters::new();
        for (k, v) in iter {
            filters.insert(k, v);
        }
        filters
    }
}

/// Identifier of a cached result set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: String,
    id: Option<String>,
    params: Option<Filters>,
}

impl QueryKey {
    /// Key for the whole collection of a resource: `[resource]`
    pub fn list(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        debug_assert!(
            !resource.contains(['/', '?']),
            "resource names must not contain '/' or '?'"
        );
        Self {
            resource,
            id: None,
            params: None,
        }
    }

    /// Key for a single record: `[resource, id]`
    pub fn item(resource: impl Into<String>, id: impl fmt::Display) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Self::list(resource)
        }
    }

    /// Attach query parameters; empty filters leave the key unchanged
    pub fn with_params(mut self, params: Filters) -> Self {
        self.params = (!params.is_empty()).then_some(params);
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn params(&self) -> Option<&Filters> {
        self.params.as_ref()
    }

    /// Whether this key belongs to `resource`
    pub fn matches_resource(&self, resource: &str) -> bool {
        self.resource == resource
    }

    /// Canonical string form used as the cache index
    pub fn cache_key(&self) -> String {
        self.to_string()
    }

    /// Extracts the resource segment of a rendered cache key
    pub fn resource_of(cache_key: &str) -> &str {
        cache_key
            .split(['/', '?'])
            .next()
            .unwrap_or(cache_key)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.resource)?;
        if let Some(id) = &self.id {
            write!(f, "/{id}")?;
        }
        if let Some(params) = &self.params {
            write!(f, "?{}", params.to_query_string())?;
        }
        Ok(())
    }
}
