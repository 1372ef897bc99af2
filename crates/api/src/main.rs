use std::sync::Arc;

use anyhow::Context;

use greengrocer_api::app::{AppServices, build_app};
use greengrocer_api::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    greengrocer_observability::init();

    let config = Config::from_env()?;
    tracing::info!(?config, "configuration loaded");

    let services = AppServices::from_config(&config).await?;
    let app = build_app(Arc::new(services));

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
