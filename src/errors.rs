//! Error types for the marketplace data layer
//!
//! Errors live inside hook state (`State::Error`, `MutationState::Error`), so they
//! must be `Clone + PartialEq`. Non-clonable sources such as `reqwest::Error` are
//! flattened into their message at the boundary.

use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout the crate
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors produced by the HTTP adapter, API modules, storage and runtime
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// The request never produced a response (DNS, connect, reset, ...)
    #[error("Network error: {0}")]
    Transport(String),

    /// The request exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The backend answered with a non-2xx status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The body could not be decoded into the expected type
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// A `{success, data}` envelope was malformed or reported failure
    #[error("Unexpected response envelope: {0}")]
    Envelope(String),

    /// Durable storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The global runtime was used before `init()`
    #[error("Global providers not initialized. Call marketplace_provider::init() first.")]
    NotInitialized,
}

impl ClientError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an API response error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether a retry could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// HTTP status of an API error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// A message suitable for showing to the user
    ///
    /// Backend validation failures usually arrive as `{"message": "..."}` or
    /// `{"error": "..."}`; the inner text is preferred over the raw body.
    pub fn user_message(&self) -> String {
        if let Self::Api { message, .. } = self
            && let Ok(value) = serde_json::from_str::<serde_json::Value>(message)
        {
            for field in ["message", "error"] {
                if let Some(text) = value.get(field).and_then(|v| v.as_str()) {
                    return text.to_string();
                }
            }
        }
        self.to_string()
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<crate::global::GlobalProviderError> for ClientError {
    fn from(_: crate::global::GlobalProviderError) -> Self {
        Self::NotInitialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(ClientError::Transport("reset".into()).is_retryable());
        assert!(ClientError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(ClientError::api(503, "down").is_retryable());
        assert!(ClientError::api(429, "slow down").is_retryable());
        assert!(!ClientError::api(422, "invalid").is_retryable());
        assert!(!ClientError::Decode("bad".into()).is_retryable());
    }

    #[test]
    fn user_message_prefers_backend_text() {
        let err = ClientError::api(422, r#"{"message":"Email already registered"}"#);
        assert_eq!(err.user_message(), "Email already registered");

        let err = ClientError::api(400, r#"{"success":false,"error":"Missing title"}"#);
        assert_eq!(err.user_message(), "Missing title");

        let err = ClientError::api(500, "Internal Server Error");
        assert_eq!(err.user_message(), "API error (500): Internal Server Error");
    }
}
