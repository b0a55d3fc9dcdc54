//! HTTP routes
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /health` | 200 |
//! | `POST /webhook`, bad or missing signature | 401, deploy not run |
//! | `POST /webhook`, body is not JSON | 400 |
//! | `POST /webhook`, ping or other branch | 200 |
//! | `POST /webhook`, deploy ran | 200 |
//! | `POST /webhook`, deploy failed | 500 |

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{
    deploy::{DeployRequest, Deployer},
    errors::WebhookError,
    signature::{SIGNATURE_HEADER, verify_signature},
};

const EVENT_HEADER: &str = "X-GitHub-Event";

/// Shared state of the router
pub struct AppState<D> {
    secret: Vec<u8>,
    deploy_ref: String,
    deployer: D,
    // One deploy at a time
    running: Mutex<()>,
}

impl<D: Deployer> AppState<D> {
    pub fn new(secret: impl Into<Vec<u8>>, deploy_ref: impl Into<String>, deployer: D) -> Self {
        Self {
            secret: secret.into(),
            deploy_ref: deploy_ref.into(),
            deployer,
            running: Mutex::new(()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PushEvent {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
    after: Option<String>,
}

pub fn router<D: Deployer>(state: AppState<D>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(webhook::<D>))
        .with_state(Arc::new(state))
}

async fn health() -> &'static str {
    "ok"
}

async fn webhook<D: Deployer>(
    State(state): State<Arc<AppState<D>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    verify_signature(&state.secret, &body, signature)?;

    let event: PushEvent =
        serde_json::from_slice(&body).map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

    let kind = headers
        .get(EVENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("push");
    if kind == "ping" {
        tracing::info!("Received ping");
        return Ok((StatusCode::OK, "pong"));
    }

    let Some(git_ref) = event.git_ref.filter(|r| *r == state.deploy_ref) else {
        tracing::info!(event = kind, "Ignoring push to a non-deploy branch");
        return Ok((StatusCode::OK, "ignored"));
    };

    let _running = state.running.lock().await;
    state
        .deployer
        .deploy(DeployRequest {
            git_ref,
            commit: event.after,
        })
        .await?;
    Ok((StatusCode::OK, "deployed"))
}
