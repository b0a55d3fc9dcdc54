//! # deploy-webhook
//!
//! Receives push notifications from the git host and runs the deploy script
//! when the default branch moves. Every request must carry an
//! `X-Hub-Signature-256` HMAC of its raw body; nothing in the payload is read
//! before the signature checks out.

pub mod config;
pub mod deploy;
pub mod errors;
pub mod server;
pub mod signature;

pub use config::WebhookConfig;
pub use deploy::{DeployRequest, Deployer, ScriptDeployer};
pub use errors::WebhookError;
pub use server::{AppState, router};
