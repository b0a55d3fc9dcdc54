//! Client configuration
//!
//! Defaults suit a local backend; [`ClientConfig::from_env`] reads overrides
//! from the environment and builder methods cover everything else.

use std::{env, path::PathBuf, time::Duration};

use crate::errors::{ClientError, ClientResult};

/// Default backend base URL (the Express API in development)
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How long an unreferenced cache entry survives
pub const DEFAULT_CACHE_RETENTION: Duration = Duration::from_secs(5 * 60);

/// Upper bound on cached query results
pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 1000;

/// Retry policy for transient request failures
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first one; `1` disables retries
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl RetryConfig {
    /// A single attempt, no retries
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }

    /// Up to `max_attempts` with exponential backoff from 200ms
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::disabled()
        }
    }

    /// Delay before `attempt` (1-based retry number)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Configuration for the HTTP adapter and the query runtime
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every resource path is appended to
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    pub retry: RetryConfig,
    /// Retention window for cache entries without subscribers
    pub cache_retention: Duration,
    pub max_cache_entries: usize,
    /// Where the durable session file lives; `None` uses the platform data dir
    pub storage_path: Option<PathBuf>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
            cache_retention: DEFAULT_CACHE_RETENTION,
            max_cache_entries: DEFAULT_MAX_CACHE_ENTRIES,
            storage_path: None,
            user_agent: concat!("marketplace-provider/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// - `MARKETPLACE_API_URL`: base URL
    /// - `MARKETPLACE_TIMEOUT_SECS`: request timeout in seconds
    /// - `MARKETPLACE_RETRY_ATTEMPTS`: total attempts per request
    /// - `MARKETPLACE_CACHE_RETENTION_SECS`: retention for unreferenced entries
    /// - `MARKETPLACE_STORAGE_PATH`: session file location
    pub fn from_env() -> ClientResult<Self> {
        let mut config = Self::default();

        if let Ok(url) = env::var("MARKETPLACE_API_URL") {
            config.base_url = url;
        }
        if let Some(secs) = parse_env::<u64>("MARKETPLACE_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = parse_env::<u32>("MARKETPLACE_RETRY_ATTEMPTS")? {
            config.retry = RetryConfig::with_attempts(attempts);
        }
        if let Some(secs) = parse_env::<u64>("MARKETPLACE_CACHE_RETENTION_SECS")? {
            config.cache_retention = Duration::from_secs(secs);
        }
        if let Ok(path) = env::var("MARKETPLACE_STORAGE_PATH") {
            config.storage_path = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cache_retention(mut self, retention: Duration) -> Self {
        self.cache_retention = retention;
        self
    }

    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ClientResult<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::config("base_url cannot be empty"));
        }
        if url::Url::parse(&self.base_url).is_err() {
            return Err(ClientError::config(format!(
                "base_url is not a valid URL: {}",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::config("timeout cannot be zero"));
        }
        if self.retry.max_attempts == 0 {
            return Err(ClientError::config("retry.max_attempts must be at least 1"));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &str) -> ClientResult<Option<T>> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ClientError::config(format!("{var} has an invalid value: {raw}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.retry.max_attempts, 1);
    }

    #[test]
    fn validation_rejects_bad_values() {
        assert!(ClientConfig::default().with_base_url("").validate().is_err());
        assert!(ClientConfig::default().with_base_url("not a url").validate().is_err());
        assert!(
            ClientConfig::default()
                .with_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let retry = RetryConfig::with_attempts(5);
        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(retry.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(retry.delay_for_attempt(3), Duration::from_millis(800));
        assert_eq!(retry.delay_for_attempt(10), Duration::from_secs(5));
    }
}
