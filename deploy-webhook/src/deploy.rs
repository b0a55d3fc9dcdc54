//! Running the deploy

use std::{future::Future, path::PathBuf, process::Stdio};

use tokio::process::Command;

use crate::errors::WebhookError;

/// What triggered a deploy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    /// Full ref, e.g. `refs/heads/main`
    pub git_ref: String,
    /// Commit the branch now points at, when the payload names one
    pub commit: Option<String>,
}

/// Performs a deploy
pub trait Deployer: Send + Sync + 'static {
    fn deploy(&self, request: DeployRequest) -> impl Future<Output = Result<(), WebhookError>> + Send;
}

/// Runs a script with the ref and commit in its environment
#[derive(Debug, Clone)]
pub struct ScriptDeployer {
    script: PathBuf,
}

impl ScriptDeployer {
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl Deployer for ScriptDeployer {
    async fn deploy(&self, request: DeployRequest) -> Result<(), WebhookError> {
        tracing::info!(script = %self.script.display(), git_ref = %request.git_ref, "Running deploy script");

        let output = Command::new(&self.script)
            .env("DEPLOY_REF", &request.git_ref)
            .env("DEPLOY_COMMIT", request.commit.as_deref().unwrap_or_default())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(WebhookError::Spawn)?;

        if output.status.success() {
            tracing::info!(
                stdout = %String::from_utf8_lossy(&output.stdout).trim(),
                "Deploy script finished"
            );
            Ok(())
        } else {
            Err(WebhookError::DeployFailed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn request() -> DeployRequest {
        DeployRequest {
            git_ref: "refs/heads/main".into(),
            commit: Some("abc123".into()),
        }
    }

    #[tokio::test]
    async fn missing_script_is_a_spawn_error() {
        let deployer = ScriptDeployer::new("/nonexistent/deploy.sh");
        assert!(matches!(
            deployer.deploy(request()).await,
            Err(WebhookError::Spawn(_))
        ));
    }

    #[tokio::test]
    async fn exit_status_decides_success() {
        assert!(ScriptDeployer::new("true").deploy(request()).await.is_ok());
        assert!(matches!(
            ScriptDeployer::new("false").deploy(request()).await,
            Err(WebhookError::DeployFailed { status: Some(1), .. })
        ));
    }
}
