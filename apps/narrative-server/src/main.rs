use std::sync::Arc;

use anyhow::Result;
use narrative_api::{build_router, AppState};
use narrative_common::config::Config;
use narrative_scheduler::TaskScheduler;
use narrative_signals::SignalDetector;
use narrative_store::Store;
use narrative_worker::build_registry;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("narrative=info".parse()?))
        .init();

    let config = Config::from_env();
    config.log_redacted();

    let store = Store::connect(&config.database_url).await?;
    let signals = SignalDetector::new(store.clone());

    // Built from the same catalog wiring as narrative-worker, but this
    // process never calls `start()` — only the worker runs the cron
    // schedule. Here the scheduler exists solely so `/admin/trigger-briefing`
    // has something real to dispatch through `trigger()`.
    let registry = build_registry(&config, store.clone());
    let scheduler = TaskScheduler::new(registry).await?;

    let state = Arc::new(AppState {
        store,
        signals,
        scheduler,
        api_key: config.api_key.clone(),
    });

    let app = build_router(state, &config.cors_origins, cfg!(debug_assertions));

    let addr = format!("{}:{}", config.web_host, config.web_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "narrative-server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
