//! Common trait bounds used throughout the query layer

/// Bounds for query parameters (ids, filters, periods)
pub trait QueryParamBounds:
    Clone + PartialEq + std::hash::Hash + std::fmt::Debug + Send + Sync + 'static
{
}
impl<T> QueryParamBounds for T where
    T: Clone + PartialEq + std::hash::Hash + std::fmt::Debug + Send + Sync + 'static
{
}

/// Bounds for values stored in the query cache
pub trait QueryOutputBounds: Clone + PartialEq + Send + Sync + 'static {}
impl<T> QueryOutputBounds for T where T: Clone + PartialEq + Send + Sync + 'static {}

/// Bounds for query errors
pub trait QueryErrorBounds: Clone + PartialEq + Send + Sync + 'static {}
impl<T> QueryErrorBounds for T where T: Clone + PartialEq + Send + Sync + 'static {}
