//! # Global Runtime Management
//!
//! The query cache is process-wide state: every component reads from and every
//! mutation invalidates the same [`QueryRuntime`], installed once at startup.

use std::{sync::OnceLock, time::Duration};

use crate::{
    config::ClientConfig,
    runtime::{QueryRuntime, QueryRuntimeConfig},
};

/// Error type for global runtime operations
#[derive(Debug, thiserror::Error)]
pub enum GlobalProviderError {
    #[error("Global providers not initialized. Call marketplace_provider::init() first.")]
    NotInitialized,
}

/// Global singleton instance of the query runtime
static GLOBAL_RUNTIME: OnceLock<QueryRuntime> = OnceLock::new();

/// Configuration for initializing the global query runtime
#[derive(Default, Debug, Clone)]
pub struct ProviderConfig {
    runtime: QueryRuntimeConfig,
}

impl ProviderConfig {
    /// Create a new provider configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Take retention settings from the client configuration
    pub fn from_client_config(config: &ClientConfig) -> Self {
        Self {
            runtime: QueryRuntimeConfig {
                cache_retention: config.cache_retention,
                max_cache_entries: config.max_cache_entries,
            },
        }
    }

    /// How long results nobody reads stay cached
    pub fn with_cache_retention(mut self, retention: Duration) -> Self {
        self.runtime.cache_retention = retention;
        self
    }

    pub fn with_max_cache_entries(mut self, max: usize) -> Self {
        self.runtime.max_cache_entries = max;
        self
    }

    /// Initialize the global runtime with this configuration
    ///
    /// Only the first call takes effect; later calls keep the existing runtime.
    pub fn init(self) -> Result<(), GlobalProviderError> {
        let runtime = GLOBAL_RUNTIME.get_or_init(|| QueryRuntime::new(self.runtime));
        runtime.ensure_maintenance();
        Ok(())
    }
}

/// Initialize the global query runtime with default settings
///
/// ## Example
///
/// ```rust,no_run
/// fn main() {
///     marketplace_provider::init().unwrap();
///     // dioxus::launch(app);
/// }
/// ```
pub fn init() -> Result<(), GlobalProviderError> {
    ProviderConfig::new().init()
}

/// Get the global query runtime
///
/// ## Errors
///
/// Returns `GlobalProviderError::NotInitialized` if `init()` has not been called yet.
pub fn get_global_runtime() -> Result<&'static QueryRuntime, GlobalProviderError> {
    GLOBAL_RUNTIME
        .get()
        .ok_or(GlobalProviderError::NotInitialized)
}

/// Check if the global runtime has been initialized
pub fn is_initialized() -> bool {
    GLOBAL_RUNTIME.get().is_some()
}

/// Ensure that the global runtime has been initialized
pub fn ensure_initialized() -> Result<(), crate::errors::ClientError> {
    get_global_runtime()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init().unwrap();
        ProviderConfig::new()
            .with_cache_retention(Duration::from_secs(1))
            .init()
            .unwrap();

        assert!(is_initialized());
        assert!(ensure_initialized().is_ok());
        let runtime = get_global_runtime().unwrap();
        assert_eq!(
            runtime.config().cache_retention,
            crate::config::DEFAULT_CACHE_RETENTION
        );
    }

    #[test]
    fn provider_config_follows_client_config() {
        let client = ClientConfig::default().with_cache_retention(Duration::from_secs(60));
        let config = ProviderConfig::from_client_config(&client);

        assert_eq!(config.runtime.cache_retention, Duration::from_secs(60));
        assert_eq!(config.runtime.max_cache_entries, client.max_cache_entries);
    }
}
