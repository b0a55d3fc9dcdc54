//! Site content, feature flags, analytics and professional search

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    envelope::{Envelope, select_field},
    errors::ClientResult,
    http::{HttpClient, RequestOptions},
    key::Filters,
};

use super::entities::{Announcement, Professional};

/// Content key to rendered text
pub type ContentMap = HashMap<String, String>;

/// Feature id to enabled flag
pub type FeatureFlags = HashMap<String, bool>;

/// Reporting window for the analytics dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    #[default]
    Week,
    Month,
    Quarter,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
        }
    }

    pub fn to_filters(self) -> Filters {
        Filters::new().with("period", self.as_str())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Professional search form
///
/// Unset fields are omitted from the request; values are sent as typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    pub query: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub min_rating: Option<f32>,
    pub max_price: Option<u32>,
    pub sort_by: Option<String>,
}

impl SearchFilters {
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    pub fn to_filters(&self) -> Filters {
        let mut filters = Filters::new();
        if let Some(q) = &self.query {
            filters.insert("q", q.trim());
        }
        if let Some(category) = &self.category {
            filters.insert("category", category);
        }
        if let Some(location) = &self.location {
            filters.insert("location", location);
        }
        if let Some(rating) = self.min_rating {
            filters.insert("minRating", rating);
        }
        if let Some(price) = self.max_price {
            filters.insert("maxPrice", price);
        }
        if let Some(sort) = &self.sort_by {
            filters.insert("sortBy", sort);
        }
        filters
    }
}

#[derive(Clone)]
pub struct ContentApi {
    client: HttpClient,
}

impl PartialEq for ContentApi {
    fn eq(&self, other: &Self) -> bool {
        self.client.base_url() == other.client.base_url()
    }
}

impl ContentApi {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    fn options() -> RequestOptions {
        RequestOptions::new().with_envelope(Envelope::Auto)
    }

    /// `GET /content`
    pub async fn content(&self) -> ClientResult<ContentMap> {
        let payload = self.client.get("/content", Self::options()).await?;
        Ok(serde_json::from_value(payload)?)
    }

    /// `GET /announcements`
    pub async fn announcements(&self) -> ClientResult<Vec<Announcement>> {
        let payload = self.client.get("/announcements", Self::options()).await?;
        Ok(serde_json::from_value(select_field(
            payload,
            "announcements",
        )?)?)
    }

    /// `GET /features`
    pub async fn features(&self) -> ClientResult<FeatureFlags> {
        let payload = self.client.get("/features", Self::options()).await?;
        Ok(serde_json::from_value(payload)?)
    }

    /// `GET /analytics?period=`; the dashboard payload is passed through as-is
    pub async fn analytics(&self, period: Period) -> ClientResult<Value> {
        self.client
            .get(
                "/analytics",
                Self::options().with_query(period.to_filters()),
            )
            .await
    }

    /// `GET /professionals/search?...`, filters built by [`SearchFilters::to_filters`]
    pub async fn search_professionals(&self, filters: Filters) -> ClientResult<Vec<Professional>> {
        let payload = self
            .client
            .get(
                "/professionals/search",
                Self::options().with_query(filters),
            )
            .await?;
        Ok(serde_json::from_value(select_field(
            payload,
            "professionals",
        )?)?)
    }
}
