//! Operational scripts for the narrative intelligence core.
//!
//! A standalone workspace so its dependency graph (and lockfile) never
//! collides with the main crate's. Talks to the same Postgres document
//! store directly - no HTTP hop through `narrative-server`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use narrative_store::Store;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "dev-cli")]
#[command(about = "Operational scripts: backfills, consolidation, cost report")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One-shot repair for narratives missing a fingerprint hash.
    FingerprintBackfill {
        #[arg(long)]
        dry_run: bool,
    },

    /// One-shot repair for narratives missing a narrative_focus string.
    NarrativeFocusBackfill {
        #[arg(long)]
        dry_run: bool,
    },

    /// Merge duplicate active narratives that independently crossed the
    /// same-nucleus similarity threshold.
    Consolidate {
        #[arg(long)]
        dry_run: bool,
    },

    /// Print LLM spend for the trailing window.
    CostReport {
        #[arg(long, default_value = "30")]
        days: i64,

        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let store = Store::connect(&database_url).await?;

    match cli.command {
        Commands::FingerprintBackfill { dry_run } => cmd::fingerprint_backfill::run(store, dry_run).await,
        Commands::NarrativeFocusBackfill { dry_run } => cmd::narrative_focus_backfill::run(store, dry_run).await,
        Commands::Consolidate { dry_run } => cmd::consolidate::run(store, dry_run).await,
        Commands::CostReport { days, dry_run } => cmd::cost_report::run(store, days, dry_run).await,
    }
}
