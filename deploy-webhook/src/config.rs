//! Command line and environment configuration

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "deploy-webhook")]
#[command(about = "Redeploys the marketplace when the default branch is pushed")]
#[command(version)]
pub struct WebhookConfig {
    /// Address to listen on
    #[arg(long, env = "WEBHOOK_LISTEN", default_value = "0.0.0.0:9000")]
    pub listen: SocketAddr,

    /// Shared secret configured on the git host
    #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Script run on every accepted push
    #[arg(long, env = "DEPLOY_SCRIPT", default_value = "./deploy.sh")]
    pub script: PathBuf,

    /// Pushes to other branches are acknowledged and ignored
    #[arg(long, env = "DEPLOY_BRANCH", default_value = "main")]
    pub branch: String,
}

impl WebhookConfig {
    /// The `ref` a push to the deploy branch carries
    pub fn deploy_ref(&self) -> String {
        format!("refs/heads/{}", self.branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_the_secret_is_given() {
        let config = WebhookConfig::try_parse_from(["deploy-webhook", "--secret", "s3cret"]).unwrap();
        assert_eq!(config.listen, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.script, PathBuf::from("./deploy.sh"));
        assert_eq!(config.deploy_ref(), "refs/heads/main");
    }

    #[test]
    fn branch_can_be_overridden() {
        let config = WebhookConfig::try_parse_from([
            "deploy-webhook",
            "--secret",
            "s3cret",
            "--branch",
            "production",
        ])
        .unwrap();
        assert_eq!(config.deploy_ref(), "refs/heads/production");
    }
}
