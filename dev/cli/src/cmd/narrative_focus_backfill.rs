use anyhow::Result;
use narrative_graph::NarrativeFocusBackfill;
use narrative_store::Store;
use tracing::info;

pub async fn run(store: Store, dry_run: bool) -> Result<()> {
    let backfill = NarrativeFocusBackfill::new(store.narratives.clone());

    if dry_run {
        let missing = store.narratives.list_missing_narrative_focus().await?;
        info!(candidates = missing.len(), "narrative-focus backfill dry run");
        for narrative in &missing {
            println!("would backfill narrative_focus: {} ({})", narrative.id, narrative.nucleus_entity);
        }
        println!("{} narrative(s) would be backfilled", missing.len());
        return Ok(());
    }

    let fixed = backfill.run().await?;
    println!("narrative-focus backfill complete: {fixed} narrative(s) updated");
    Ok(())
}
