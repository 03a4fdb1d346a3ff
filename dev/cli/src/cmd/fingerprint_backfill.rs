use anyhow::Result;
use narrative_graph::FingerprintBackfill;
use narrative_store::Store;
use tracing::info;

pub async fn run(store: Store, dry_run: bool) -> Result<()> {
    let backfill = FingerprintBackfill::new(store.narratives.clone());

    if dry_run {
        let missing = store.narratives.list_missing_fingerprint_hash().await?;
        info!(candidates = missing.len(), "fingerprint backfill dry run");
        for narrative in &missing {
            println!("would backfill fingerprint: {} ({})", narrative.id, narrative.nucleus_entity);
        }
        println!("{} narrative(s) would be backfilled", missing.len());
        return Ok(());
    }

    let fixed = backfill.run().await?;
    println!("fingerprint backfill complete: {fixed} narrative(s) updated");
    Ok(())
}
