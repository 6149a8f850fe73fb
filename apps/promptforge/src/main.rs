use std::sync::Arc;

use promptforge_core::{
    config::AppConfig,
    http::{self, AppState},
    model::{CompletionTransport, OpenRouterTransport},
    relay::PromptRelay,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    init_tracing();

    if let Err(error) = dotenv {
        warn!(%error, "no .env file loaded; using process environment only");
    }

    let config = AppConfig::from_env()?;
    let template = config.load_template()?;

    if config.openrouter_api_key.is_none() {
        warn!("OPENROUTER_API_KEY is not set; /generate will fail until it is configured");
    }
    if config.upstream_timeout.is_none() {
        warn!("UPSTREAM_TIMEOUT_SECS is not set; upstream calls can hang indefinitely");
    }

    let transport = build_transport(&config)?;
    let relay = Arc::new(PromptRelay::new(config.relay_config(template), transport));

    let app = http::router(AppState { relay });
    let listener = TcpListener::bind(config.http_bind).await?;
    info!(
        model = %config.openrouter_model,
        "PromptForge HTTP API listening on {}",
        config.http_bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .init();
}

fn build_transport(config: &AppConfig) -> anyhow::Result<Arc<dyn CompletionTransport>> {
    let transport = OpenRouterTransport::from_config(config)?;
    info!(endpoint = %transport.endpoint(), "using OpenRouter transport");
    Ok(Arc::new(transport))
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(?error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
