//! Webhook errors and their HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("missing X-Hub-Signature-256 header")]
    MissingSignature,

    #[error("signature does not match payload")]
    InvalidSignature,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("failed to start deploy script: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("deploy script exited with {status:?}: {stderr}")]
    DeployFailed { status: Option<i32>, stderr: String },

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

impl WebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingSignature | Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            Self::Spawn(_) | Self::DeployFailed { .. } | Self::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Deploy failed");
            // Script output stays in the log
            (status, "deploy failed").into_response()
        } else {
            tracing::warn!(error = %self, "Rejected webhook request");
            (status, self.to_string()).into_response()
        }
    }
}
