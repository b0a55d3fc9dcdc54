//! HTTP client adapter
//!
//! Wraps `reqwest` with the backend base URL, per-request bearer tokens,
//! a request timeout, optional retry with backoff and envelope unwrapping.
//!
//! The bearer token is never stored in shared default headers. Each request asks
//! its [`TokenSource`] (normally the session's [`SessionToken`]) at send time, or
//! uses the token passed explicitly in [`RequestOptions`].

use std::{
    sync::{Arc, RwLock},
    time::Instant,
};

use reqwest::{
    Client, Method, Response,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    config::ClientConfig,
    envelope::Envelope,
    errors::{ClientError, ClientResult},
    key::Filters,
};

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Supplies the bearer token for outgoing requests
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// The current session's token, shared between the session and the HTTP adapter
#[derive(Debug, Clone, Default)]
pub struct SessionToken(Arc<RwLock<Option<String>>>);

impl SessionToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests sent after this carry `Authorization: Bearer <token>`
    pub fn set_token(&self, token: impl Into<String>) {
        if let Ok(mut slot) = self.0.write() {
            *slot = Some(token.into());
        }
    }

    /// Requests sent after this carry no `Authorization` header
    pub fn clear_token(&self) {
        if let Ok(mut slot) = self.0.write() {
            *slot = None;
        }
    }
}

impl TokenSource for SessionToken {
    fn token(&self) -> Option<String> {
        self.0.read().ok().and_then(|slot| slot.clone())
    }
}

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query-string parameters
    pub query: Option<Filters>,
    /// Token for this request only; takes precedence over the token source
    pub token: Option<String>,
    /// How to unwrap the response body
    pub envelope: Envelope,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: Filters) -> Self {
        self.query = (!query.is_empty()).then_some(query);
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }
}

/// HTTP adapter shared by every API module
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    config: Arc<ClientConfig>,
    token_source: Option<Arc<dyn TokenSource>>,
}

impl HttpClient {
    /// Create a client with specific configuration
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(agent) = HeaderValue::from_str(&config.user_agent) {
            default_headers.insert(USER_AGENT, agent);
        }

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| ClientError::config(e.to_string()))?;

        Ok(Self {
            inner,
            config: Arc::new(config),
            token_source: None,
        })
    }

    /// Attach the source consulted for the bearer token on every request
    pub fn with_token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub async fn get(&self, path: &str, options: RequestOptions) -> ClientResult<Value> {
        self.send(Method::GET, path, Option::<&()>::None, options)
            .await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> ClientResult<Value> {
        self.send(Method::POST, path, Some(body), options).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> ClientResult<Value> {
        self.send(Method::PUT, path, Some(body), options).await
    }

    pub async fn delete(&self, path: &str, options: RequestOptions) -> ClientResult<Value> {
        self.send(Method::DELETE, path, Option::<&()>::None, options)
            .await
    }

    /// Send a request and decode the unwrapped payload as `T`
    pub async fn request_as<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> ClientResult<T> {
        let payload = self.send(method, path, body, options).await?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Send a request and return the payload with the envelope removed.
    ///
    /// Transient failures are retried per the retry policy, for idempotent
    /// methods only; a POST is sent exactly once.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> ClientResult<Value> {
        let request_id = Uuid::new_v4().to_string();
        let url = self.url_for(path);
        let retry = &self.config.retry;
        let may_retry = is_idempotent(&method);
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                let delay = retry.delay_for_attempt(attempt);
                crate::debug_log!(
                    request_id = %request_id,
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after delay"
                );
                tokio::time::sleep(delay).await;
            }
            attempt += 1;

            let start = Instant::now();
            let result = self
                .send_once(&request_id, method.clone(), &url, body, &options)
                .await;
            crate::log_request!(
                "{} {} -> {} in {:?} (request_id: {})",
                method,
                url,
                if result.is_ok() { "ok" } else { "error" },
                start.elapsed(),
                request_id
            );

            match result {
                Ok(body) => return options.envelope.unwrap(body),
                Err(e) if may_retry && e.is_retryable() && attempt < retry.max_attempts => {
                    crate::debug_log!(request_id = %request_id, error = %e, "Request failed, will retry");
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once<B: Serialize + ?Sized>(
        &self,
        request_id: &str,
        method: Method,
        url: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> ClientResult<Value> {
        let mut request = self
            .inner
            .request(method, url)
            .header(X_REQUEST_ID, request_id);

        if let Some(query) = &options.query {
            let pairs: Vec<(&str, &str)> = query.iter().collect();
            request = request.query(&pairs);
        }

        let token = options
            .token
            .clone()
            .or_else(|| self.token_source.as_ref().and_then(|s| s.token()));
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.map_transport(e))?;
        self.handle_response(response).await
    }

    async fn handle_response(&self, response: Response) -> ClientResult<Value> {
        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_transport(e))?;

        if !status.is_success() {
            return Err(ClientError::api(status.as_u16(), text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn map_transport(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.config.timeout)
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS
    )
}
