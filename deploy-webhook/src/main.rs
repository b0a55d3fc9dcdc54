use clap::Parser;
use deploy_webhook::{AppState, ScriptDeployer, WebhookConfig, WebhookError, router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), WebhookError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = WebhookConfig::parse();
    let state = AppState::new(
        config.secret.clone(),
        config.deploy_ref(),
        ScriptDeployer::new(&config.script),
    );

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    tracing::info!(
        listen = %config.listen,
        branch = %config.branch,
        script = %config.script.display(),
        "Deploy webhook listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
