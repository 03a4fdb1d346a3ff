use anyhow::Result;
use narrative_graph::Consolidator;
use narrative_store::Store;

pub async fn run(store: Store, dry_run: bool) -> Result<()> {
    let consolidator = Consolidator::new(store.narratives.clone());
    let (decisions, stats) = consolidator.run_with_stats(dry_run).await?;

    for decision in &decisions {
        println!(
            "{} absorbs {} (similarity {:.2})",
            decision.survivor_id, decision.absorbed_id, decision.similarity
        );
    }
    println!("{stats}");
    Ok(())
}
