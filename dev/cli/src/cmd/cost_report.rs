use anyhow::Result;
use chrono::Utc;
use narrative_store::Store;

/// Read-only by nature; `dry_run` is accepted for uniformity with the other
/// three admin scripts but changes nothing about what this prints.
pub async fn run(store: Store, days: i64, dry_run: bool) -> Result<()> {
    if dry_run {
        println!("(--dry-run has no effect on cost-report, it never writes)");
    }

    let since = Utc::now() - chrono::Duration::days(days);
    let total = store.cost_records.total_since(since).await?;
    println!("=== Cost Report (last {days} day(s)) ===");
    println!("Total spend: ${total:.4}");
    println!();

    println!("By day:");
    for (date, cost) in store.cost_records.daily_breakdown(days).await? {
        println!("  {date}  ${cost:.4}");
    }
    println!();

    println!("By model:");
    for (model, cost, calls) in store.cost_records.by_model(days).await? {
        println!("  {model:<30} ${cost:.4}  ({calls} calls)");
    }

    Ok(())
}
