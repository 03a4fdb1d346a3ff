use chrono::Utc;
use narrative_common::types::{Article, ExtractionMethod, RelevanceTier, Sentiment};
use narrative_extract::{Extractor, RelevanceClassifier};
use narrative_graph::NarrativeEngine;
use narrative_store::Store;
use tracing::{info, warn};
use uuid::Uuid;

use crate::feed::{FeedFetcher, RawFeedItem};
use crate::rate_limiter::RateLimiter;

const MAX_ARTICLES_PER_MINUTE: usize = 20;

pub struct IngestSummary {
    pub fetched: usize,
    pub skipped_duplicate: usize,
    pub enriched: usize,
    pub skipped_low_relevance: usize,
    pub failed_extraction: usize,
}

/// C12: fetch → dedupe → classify → enrich → persist, feeding each
/// enriched article into the narrative engine (§2 data flow C12 → C6 →
/// C7 → C8).
pub struct IngestPipeline {
    store: Store,
    fetcher: FeedFetcher,
    classifier: RelevanceClassifier,
    extractor: Extractor,
    engine: NarrativeEngine,
    rate_limiter: RateLimiter,
}

impl IngestPipeline {
    pub fn new(store: Store, extractor: Extractor) -> Self {
        let engine = NarrativeEngine::new(store.clone());
        Self {
            store,
            fetcher: FeedFetcher::new(),
            classifier: RelevanceClassifier::new(),
            extractor,
            engine,
            rate_limiter: RateLimiter::new(MAX_ARTICLES_PER_MINUTE),
        }
    }

    pub async fn ingest_feed(&self, feed_url: &str, source: &str) -> anyhow::Result<IngestSummary> {
        let items = self.fetcher.fetch(feed_url).await?;
        let mut summary = IngestSummary { fetched: items.len(), skipped_duplicate: 0, enriched: 0, skipped_low_relevance: 0, failed_extraction: 0 };

        let mut to_enrich: Vec<(RawFeedItem, String)> = Vec::new();

        for item in items {
            if self.store.articles.get_by_url(&item.url).await?.is_some() {
                summary.skipped_duplicate += 1;
                continue;
            }

            let fingerprint_hash = Article::compute_fingerprint(&item.title, &item.body);
            let tier = self.classifier.classify(&item.title, &item.body);

            if tier == RelevanceTier::Three {
                summary.skipped_low_relevance += 1;
                self.persist_unenriched(item, fingerprint_hash, tier, source).await?;
                continue;
            }

            to_enrich.push((item, fingerprint_hash));
        }

        for _ in &to_enrich {
            self.rate_limiter.acquire().await;
        }

        let title_body_pairs: Vec<(String, String)> =
            to_enrich.iter().map(|(item, _)| (item.title.clone(), item.body.clone())).collect();
        let extractions = self.extractor.extract_batch(&title_body_pairs).await;

        for ((item, fingerprint_hash), extraction) in to_enrich.into_iter().zip(extractions) {
            let Some(extraction) = extraction else {
                summary.failed_extraction += 1;
                warn!(url = %item.url, "extraction failed for article, persisting unenriched");
                self.persist_unenriched(item, fingerprint_hash, RelevanceTier::Two, source).await?;
                continue;
            };

            let tier = self.classifier.classify(&item.title, &item.body);
            let article = Article {
                id: Uuid::new_v4().to_string(),
                url: item.url,
                source: source.to_string(),
                published_at: item.published_at,
                title: item.title,
                body: item.body,
                fingerprint: fingerprint_hash,
                relevance_tier: tier,
                entities: extraction.entities.clone(),
                sentiment: extraction.sentiment,
                narrative_id: None,
                extraction_method: ExtractionMethod::Llm,
                created_at: Utc::now(),
            };

            self.store.articles.upsert(&article).await?;
            self.record_mentions(&article).await;

            match self.engine.process_article(&article, &extraction.fingerprint).await {
                Ok(narrative_id) => {
                    info!(article_id = %article.id, narrative_id = %narrative_id, "article linked to narrative");
                    summary.enriched += 1;
                }
                Err(e) => {
                    warn!(article_id = %article.id, error = %e, "narrative engine failed for article, article persisted without linkage");
                }
            }
        }

        Ok(summary)
    }

    async fn persist_unenriched(&self, item: RawFeedItem, fingerprint_hash: String, tier: RelevanceTier, source: &str) -> anyhow::Result<()> {
        let article = Article {
            id: Uuid::new_v4().to_string(),
            url: item.url,
            source: source.to_string(),
            published_at: item.published_at,
            title: item.title,
            body: item.body,
            fingerprint: fingerprint_hash,
            relevance_tier: tier,
            entities: vec![],
            sentiment: Sentiment::Neu,
            narrative_id: None,
            extraction_method: ExtractionMethod::Rule,
            created_at: Utc::now(),
        };
        self.store.articles.upsert(&article).await
    }

    async fn record_mentions(&self, article: &Article) {
        for entity in &article.entities {
            let sentiment = match article.sentiment {
                Sentiment::Pos => "pos",
                Sentiment::Neg => "neg",
                Sentiment::Neu => "neu",
            };
            if let Err(e) = self
                .store
                .entity_mentions
                .record(&entity.name, entity_type_str(entity.entity_type), &article.id, sentiment, &article.source, article.published_at)
                .await
            {
                warn!(entity = %entity.name, error = %e, "failed to record entity mention");
            }
        }
    }
}

fn entity_type_str(t: narrative_common::types::EntityType) -> &'static str {
    use narrative_common::types::EntityType::*;
    match t {
        Ticker => "ticker",
        Project => "project",
        Person => "person",
        Organization => "organization",
        Event => "event",
        Concept => "concept",
    }
}
