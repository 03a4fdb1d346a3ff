use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use narrative_common::types::{EntityType, Signal, SignalNarrativeRef};
use narrative_store::Store;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::cache::{cache_key, InProcessCache, SHARED_CACHE_TTL_SECONDS};
use crate::scoring::{ema_velocity, signal_score, source_diversity, EMERGING_MENTION_THRESHOLD, EMERGING_SCORE_FLOOR};

const WINDOW_DAYS: i64 = 7;
const MAX_CONCURRENT_QUERIES: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct SignalQuery {
    pub limit: usize,
    pub min_score: f32,
    pub entity_type: Option<String>,
    pub timeframe_hours: i64,
}

pub struct SignalDetector {
    store: Store,
    in_process: Arc<InProcessCache>,
}

impl SignalDetector {
    pub fn new(store: Store) -> Self {
        Self { store, in_process: Arc::new(InProcessCache::new()) }
    }

    pub async fn trending(&self, query: &SignalQuery) -> anyhow::Result<Vec<Signal>> {
        let key = cache_key(query.limit, query.min_score, query.entity_type.as_deref(), query.timeframe_hours);

        if let Some(cached) = self.in_process.get(&key) {
            return Ok(cached);
        }
        if let Ok(Some((signals, _))) = self.store.signals_cache.get(&key).await {
            self.in_process.put(key.clone(), signals.clone());
            return Ok(signals);
        }

        let signals = self.compute(query).await?;

        if let Err(err) = self.store.signals_cache.put(&key, &signals, SHARED_CACHE_TTL_SECONDS).await {
            warn!(?err, "failed to write signals cache, continuing uncached");
        }
        self.in_process.put(key, signals.clone());

        Ok(signals)
    }

    /// Recompute pass (§4.C9 performance contract): fan out over distinct
    /// entities with bounded concurrency rather than a single `$in`-style
    /// scan of `entity_mentions`.
    async fn compute(&self, query: &SignalQuery) -> anyhow::Result<Vec<Signal>> {
        let since = Utc::now() - chrono::Duration::hours(query.timeframe_hours.max(1));
        let entities = self.store.entity_mentions.distinct_entities_since(since).await?;

        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_QUERIES));
        let futures = entities.into_iter().filter(|(_, entity_type)| {
            query.entity_type.as_deref().map(|t| t == entity_type).unwrap_or(true)
        }).map(|(entity, entity_type)| {
            let semaphore = semaphore.clone();
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore never closed");
                self.score_entity(&entity, &entity_type, since).await
            }
        });

        let mut signals: Vec<Signal> = join_all(futures)
            .await
            .into_iter()
            .filter_map(|r| match r {
                Ok(signal) => Some(signal),
                Err(err) => {
                    warn!(?err, "signal scoring failed for an entity, skipping");
                    None
                }
            })
            .filter(|s| s.signal_score >= query.min_score)
            .collect();

        signals.sort_by(|a, b| b.signal_score.partial_cmp(&a.signal_score).unwrap_or(std::cmp::Ordering::Equal));
        signals.truncate(query.limit.max(1));

        Ok(signals)
    }

    async fn score_entity(&self, entity: &str, entity_type: &str, since: DateTime<Utc>) -> anyhow::Result<Signal> {
        let mentions = self.store.entity_mentions.mentions_since(entity, since).await?;
        let now = Utc::now();

        let timestamps: Vec<DateTime<Utc>> = mentions.iter().map(|m| m.timestamp).collect();
        let distinct_sources: std::collections::HashSet<&str> = mentions.iter().map(|m| m.source.as_str()).collect();

        let velocity = ema_velocity(&timestamps, now, WINDOW_DAYS);
        let diversity = source_diversity(distinct_sources.len(), mentions.len());
        let hours_since_last = mentions
            .last()
            .map(|m| (now - m.timestamp).num_minutes() as f64 / 60.0)
            .unwrap_or(f64::MAX);

        let sentiments: Vec<f32> = mentions
            .iter()
            .map(|m| match m.sentiment.as_str() {
                "pos" => 1.0,
                "neg" => -1.0,
                _ => 0.0,
            })
            .collect();
        let mean_sentiment = if sentiments.is_empty() {
            0.0
        } else {
            sentiments.iter().sum::<f32>() / sentiments.len() as f32
        };

        let narratives = self.store.narratives.narratives_mentioning(entity).await?;
        let is_emerging = mentions.len() < EMERGING_MENTION_THRESHOLD && narratives.is_empty();

        let mut score = signal_score(velocity, diversity, hours_since_last.min(10_000.0), mean_sentiment);
        if is_emerging {
            score = score.max(EMERGING_SCORE_FLOOR);
        }

        Ok(Signal {
            entity: entity.to_string(),
            entity_type: parse_entity_type(entity_type),
            signal_score: score,
            velocity,
            source_count: distinct_sources.len(),
            sentiment: mean_sentiment,
            is_emerging,
            narratives: narratives
                .into_iter()
                .map(|n| SignalNarrativeRef { id: n.id, theme: n.narrative_focus })
                .collect(),
            last_updated: mentions.last().map(|m| m.timestamp).unwrap_or(now),
            computed_at: now,
        })
    }
}

fn parse_entity_type(s: &str) -> EntityType {
    match s {
        "ticker" => EntityType::Ticker,
        "project" => EntityType::Project,
        "person" => EntityType::Person,
        "organization" => EntityType::Organization,
        "event" => EntityType::Event,
        _ => EntityType::Concept,
    }
}
