use anyhow::Result;
use narrative_common::config::Config;
use narrative_graph::FingerprintBackfill;
use narrative_scheduler::TaskScheduler;
use narrative_store::Store;
use narrative_worker::build_registry;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("narrative=info".parse()?))
        .init();

    let config = Config::from_env();
    config.log_redacted();

    let store = Store::connect(&config.database_url).await?;
    let registry = build_registry(&config, store.clone());

    let scheduler = TaskScheduler::new(registry).await?;
    scheduler.start().await?;

    info!("narrative-worker started, all catalog tasks scheduled");

    // Run the fingerprint backfill once at startup (§9, idempotent repair).
    match FingerprintBackfill::new(store.narratives.clone()).run().await {
        Ok(n) => info!(backfilled = n, "fingerprint backfill complete"),
        Err(e) => warn!(error = %e, "fingerprint backfill failed"),
    }

    std::future::pending::<()>().await;
    Ok(())
}
