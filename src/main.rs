use std::net::SocketAddr;

use anyhow::Context;
use gatehouse::bootstrap;
use gatehouse::config::Config;
use gatehouse::infrastructure::http::router::build_router;
use gatehouse::infrastructure::observability;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;

    let _observability = observability::init(&config)
        .map_err(|e| anyhow::anyhow!("failed to initialize observability: {}", e))?;
    tracing::info!("Configuration loaded");

    let state = bootstrap::build_app_state(&config).context("failed to build application state")?;
    let app = build_router(state);

    let addr = config.server_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
