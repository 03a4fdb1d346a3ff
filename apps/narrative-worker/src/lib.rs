use std::sync::Arc;

use narrative_briefing::BriefingGenerator;
use narrative_common::config::Config;
use narrative_common::types::BriefingType;
use narrative_extract::Extractor;
use narrative_graph::{Consolidator, NarrativeEngine};
use narrative_ingest::IngestPipeline;
use narrative_llm::{CostTracker, LlmFacade};
use narrative_scheduler::{TaskParams, TaskRegistry};
use narrative_signals::{SignalDetector, SignalQuery};
use narrative_store::Store;
use tracing::{error, info, warn};

const FAST_MODEL: &str = "claude-3-5-haiku-latest";
const QUALITY_MODEL: &str = "claude-3-5-sonnet-latest";

/// Wires every catalog task (§4.C11) to its real handler. Shared between
/// the worker binary (which also runs the schedule) and the server binary
/// (which only ever calls `TaskScheduler::trigger` against it, never
/// `start`, so the periodic cadence lives in exactly one process).
pub fn build_registry(config: &Config, store: Store) -> TaskRegistry {
    let llm = LlmFacade::new(
        config.anthropic_api_key.clone(),
        FAST_MODEL,
        QUALITY_MODEL,
        config.fallback_models.clone(),
        store.llm_cache.clone(),
        CostTracker::new(store.cost_records.clone()),
    );

    let signals = SignalDetector::new(store.clone());
    let extractor = Extractor::new(llm.clone());
    let engine = Arc::new(NarrativeEngine::new(store.clone()));
    let ingest = Arc::new(IngestPipeline::new(store.clone(), extractor));
    let briefing = Arc::new(BriefingGenerator::new(store.clone(), llm, signals.clone()));

    let mut registry = TaskRegistry::new();

    {
        let ingest = ingest.clone();
        let feed_urls = config.feed_urls.clone();
        registry.register(
            "fetch_news",
            Arc::new(move |_params| {
                let ingest = ingest.clone();
                let feed_urls = feed_urls.clone();
                Box::pin(async move { fetch_news(&ingest, &feed_urls).await })
            }),
        );
    }

    {
        let store = store.clone();
        let engine = engine.clone();
        registry.register(
            "detect_narratives",
            Arc::new(move |_params| {
                let store = store.clone();
                let engine = engine.clone();
                Box::pin(async move { detect_narratives(&store, &engine).await })
            }),
        );
    }

    {
        let engine = engine.clone();
        registry.register(
            "sweep_lifecycle",
            Arc::new(move |_params| {
                let engine = engine.clone();
                Box::pin(async move {
                    let transitioned = engine.sweep_lifecycle().await.map_err(|e| anyhow::anyhow!(e))?;
                    info!(transitioned, "lifecycle sweep complete");
                    Ok(())
                })
            }),
        );
    }

    {
        let store = store.clone();
        registry.register(
            "consolidate_narratives",
            Arc::new(move |_params| {
                let store = store.clone();
                Box::pin(async move {
                    Consolidator::new(store.narratives.clone()).run().await?;
                    Ok(())
                })
            }),
        );
    }

    {
        let signals = signals.clone();
        registry.register(
            "compute_signals",
            Arc::new(move |_params| {
                let signals = signals.clone();
                Box::pin(async move {
                    signals
                        .trending(&SignalQuery { limit: 50, min_score: 0.0, entity_type: None, timeframe_hours: 24 })
                        .await?;
                    Ok(())
                })
            }),
        );
    }

    for (task_name, briefing_type) in [
        ("generate_morning_briefing", BriefingType::Morning),
        ("generate_afternoon_briefing", BriefingType::Afternoon),
        ("generate_evening_briefing", BriefingType::Evening),
    ] {
        let briefing = briefing.clone();
        registry.register(
            task_name,
            Arc::new(move |params: TaskParams| {
                let briefing = briefing.clone();
                Box::pin(async move { generate_briefing(&briefing, briefing_type, params).await })
            }),
        );
    }

    {
        let store = store.clone();
        registry.register(
            "cleanup_old_briefings",
            Arc::new(move |_params| {
                let store = store.clone();
                Box::pin(async move {
                    let removed = store.briefings.delete_older_than(30).await?;
                    info!(removed, "cleaned up old briefings");
                    Ok(())
                })
            }),
        );
    }

    registry
}

async fn fetch_news(ingest: &IngestPipeline, feed_urls: &[String]) -> anyhow::Result<()> {
    if feed_urls.is_empty() {
        warn!("no FEED_URLS configured, fetch_news has nothing to do");
        return Ok(());
    }

    for feed_url in feed_urls {
        let source = feed_url
            .parse::<url::Url>()
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_else(|| feed_url.clone());

        match ingest.ingest_feed(feed_url, &source).await {
            Ok(summary) => info!(
                feed_url,
                fetched = summary.fetched,
                enriched = summary.enriched,
                skipped_duplicate = summary.skipped_duplicate,
                skipped_low_relevance = summary.skipped_low_relevance,
                failed_extraction = summary.failed_extraction,
                "feed ingested"
            ),
            Err(e) => error!(feed_url, error = %e, "feed ingestion failed"),
        }
    }
    Ok(())
}

async fn detect_narratives(store: &Store, engine: &NarrativeEngine) -> anyhow::Result<()> {
    let unmatched = store.articles.list_unmatched(200).await?;
    for article in unmatched {
        let fingerprint = narrative_common::types::ArticleFingerprint {
            nucleus_entity: article.entities.first().map(|e| e.name.clone()),
            narrative_focus: None,
            top_actors: Vec::new(),
            key_actions: Vec::new(),
        };
        if let Err(e) = engine.process_article(&article, &fingerprint).await {
            warn!(article_id = %article.id, error = %e, "narrative matching failed for unmatched article");
        }
    }
    Ok(())
}

async fn generate_briefing(briefing: &BriefingGenerator, briefing_type: BriefingType, params: TaskParams) -> anyhow::Result<()> {
    let local_date = chrono::Utc::now().date_naive();
    briefing
        .generate(briefing_type, local_date, params.force, params.is_smoke)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}
