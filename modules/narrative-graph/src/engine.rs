use chrono::{DateTime, Duration, Utc};
use narrative_common::error::{NarrativeError, NarrativeResult};
use narrative_common::types::{
    Article, ArticleFingerprint, LifecycleHistoryEntry, LifecycleState, Narrative, NarrativeFingerprint, NarrativeId,
    TimelineEntry,
};
use narrative_store::Store;
use uuid::Uuid;

use crate::lifecycle;
use crate::matcher::{Decision, NarrativeMatcher};

const MAX_OPTIMISTIC_RETRIES: u32 = 5;
pub(crate) const MAX_TOP_ACTORS: usize = 5;
pub(crate) const MAX_KEY_ACTIONS: usize = 3;

/// Orchestrates §4.C7 (match) + §4.C8 (lifecycle derivation) into the single
/// operation the ingest pipeline calls per enriched article: decide which
/// narrative this article belongs to, then apply Extend/Create/Reactivate.
pub struct NarrativeEngine {
    store: Store,
    matcher: NarrativeMatcher,
}

impl NarrativeEngine {
    pub fn new(store: Store) -> Self {
        let matcher = NarrativeMatcher::new(store.narratives.clone());
        Self { store, matcher }
    }

    /// Retries on optimistic-concurrency conflict (§9): `try_update` failing
    /// means another writer updated the same narrative between our read and
    /// write, so we re-run the matcher against fresh state rather than
    /// clobbering it.
    pub async fn process_article(&self, article: &Article, fingerprint: &ArticleFingerprint) -> NarrativeResult<NarrativeId> {
        for _ in 0..MAX_OPTIMISTIC_RETRIES {
            let decision = self.matcher.match_fingerprint(fingerprint).await?;

            let result = match decision {
                Decision::CreateNew => self.create(article, fingerprint).await?,
                Decision::Extend { narrative_id, .. } => self.extend(&narrative_id, article, fingerprint, false).await?,
                Decision::Reactivate { narrative_id, .. } => self.extend(&narrative_id, article, fingerprint, true).await?,
            };

            if let Some(id) = result {
                self.store.articles.set_narrative_id(&article.id, &id).await?;
                return Ok(id);
            }
            // None means a conflicting write raced us; loop and re-match.
        }

        Err(NarrativeError::Persistence(
            "exhausted retries resolving an optimistic-concurrency conflict".into(),
        ))
    }

    async fn create(&self, article: &Article, fingerprint: &ArticleFingerprint) -> NarrativeResult<Option<NarrativeId>> {
        let now = Utc::now();
        let nucleus = fingerprint.nucleus_entity.clone().unwrap_or_else(|| "unknown".to_string());
        let focus = fingerprint.narrative_focus.clone().unwrap_or_default();
        let top_actors = cap(fingerprint.top_actors.clone(), MAX_TOP_ACTORS);
        let key_actions = cap(fingerprint.key_actions.clone(), MAX_KEY_ACTIONS);

        let narrative = Narrative {
            id: Uuid::new_v4().to_string(),
            title: focus.clone(),
            summary: String::new(),
            nucleus_entity: nucleus.clone(),
            narrative_focus: focus.clone(),
            top_actors: top_actors.clone(),
            key_actions: key_actions.clone(),
            entities: vec![nucleus.clone()],
            article_ids: vec![article.id.clone()],
            article_count: 1,
            first_seen: now,
            last_updated: now,
            last_article_at: article.published_at,
            lifecycle_state: LifecycleState::Emerging,
            dormant_since: None,
            reactivated_count: 0,
            lifecycle_history: vec![LifecycleHistoryEntry {
                state: LifecycleState::Emerging,
                entered_at: now,
                article_count_at_entry: 1,
            }],
            fingerprint: NarrativeFingerprint::new(nucleus, focus, top_actors, key_actions, now),
            avg_sentiment: sentiment_score(article),
            velocity: 1.0,
            timeline_data: vec![TimelineEntry { date: now.date_naive(), article_count: 1, velocity: 1.0 }],
            archived: false,
        };

        self.store.narratives.insert(&narrative).await?;
        Ok(Some(narrative.id))
    }

    /// Shared Extend/Reactivate path — both append the article and
    /// re-derive lifecycle state; Reactivate additionally clears
    /// `dormant_since` and bumps `reactivated_count` before the derivation
    /// runs, so `next_state` sees a non-dormant `from` state.
    async fn extend(
        &self,
        narrative_id: &str,
        article: &Article,
        fingerprint: &ArticleFingerprint,
        reactivating: bool,
    ) -> NarrativeResult<Option<NarrativeId>> {
        let Some(existing) = self.store.narratives.get_by_id(narrative_id).await? else {
            return Ok(None);
        };
        let expected_last_updated = existing.last_updated;
        let now = Utc::now();

        let mut updated = existing;
        let prior_state = if reactivating { LifecycleState::Reactivated } else { updated.lifecycle_state };

        updated.article_ids.push(article.id.clone());
        updated.article_count = updated.article_ids.len();
        updated.last_article_at = updated.last_article_at.max(article.published_at);
        updated.last_updated = now;

        if let Some(actor) = fingerprint.top_actors.first() {
            if !updated.top_actors.iter().any(|a| a.eq_ignore_ascii_case(actor)) {
                updated.top_actors.push(actor.clone());
            }
        }
        updated.top_actors = cap(updated.top_actors, MAX_TOP_ACTORS);
        for action in &fingerprint.key_actions {
            if !updated.key_actions.iter().any(|a| a.eq_ignore_ascii_case(action)) {
                updated.key_actions.push(action.clone());
            }
        }
        updated.key_actions = cap(updated.key_actions, MAX_KEY_ACTIONS);

        let n = updated.article_count as f32;
        updated.avg_sentiment = ((updated.avg_sentiment * (n - 1.0)) + sentiment_score(article)) / n;

        update_timeline(&mut updated, now);

        if reactivating {
            updated.dormant_since = None;
            updated.reactivated_count += 1;
        }

        apply_lifecycle_derivation(&mut updated, prior_state, now, reactivating);

        if self.store.narratives.try_update(&updated, expected_last_updated).await? {
            Ok(Some(updated.id.clone()))
        } else {
            Ok(None)
        }
    }

    /// Periodic re-evaluation (§4.C8 "and by a periodic sweep"): `extend()`
    /// only ever runs the instant a new article arrives, when
    /// `hours_since_last_article` is necessarily ~0, so it can never carry a
    /// narrative into Cooling/Dormant on silence alone. This is the only
    /// path that does — and the only path that can recover a narrative from
    /// Cooling once its activity picks back up without a fresh article
    /// landing first. Returns the number of narratives whose state changed.
    pub async fn sweep_lifecycle(&self) -> NarrativeResult<usize> {
        let active = self.store.narratives.list_all_active_for_consolidation().await?;
        let mut transitioned = 0;

        for candidate in active {
            for _ in 0..MAX_OPTIMISTIC_RETRIES {
                let Some(existing) = self.store.narratives.get_by_id(&candidate.id).await? else {
                    break;
                };
                let expected_last_updated = existing.last_updated;
                let now = Utc::now();
                let prior_state = existing.lifecycle_state;

                let mut updated = existing;
                apply_lifecycle_derivation(&mut updated, prior_state, now, false);

                if updated.lifecycle_state == prior_state {
                    break;
                }
                updated.last_updated = now;

                if self.store.narratives.try_update(&updated, expected_last_updated).await? {
                    transitioned += 1;
                    break;
                }
                // conflict: re-read and retry against fresh state
            }
        }

        Ok(transitioned)
    }
}

pub(crate) fn cap(mut items: Vec<String>, max: usize) -> Vec<String> {
    items.truncate(max);
    items
}

/// Case-insensitive dedup-and-append, then cap — the same rule `extend()`
/// applies to a single article's actors/actions, generalized to merging
/// another narrative's whole list in (used by consolidation).
pub(crate) fn merge_capped(mut existing: Vec<String>, incoming: &[String], max: usize) -> Vec<String> {
    for item in incoming {
        if !existing.iter().any(|e| e.eq_ignore_ascii_case(item)) {
            existing.push(item.clone());
        }
    }
    cap(existing, max)
}

/// Sums two narratives' per-day timeline buckets by date, recomputing
/// velocity the same way `update_timeline` does for a single appended
/// article.
pub(crate) fn merge_timeline_data(a: &[TimelineEntry], b: &[TimelineEntry]) -> Vec<TimelineEntry> {
    let mut by_date: std::collections::BTreeMap<chrono::NaiveDate, usize> = std::collections::BTreeMap::new();
    for entry in a.iter().chain(b.iter()) {
        *by_date.entry(entry.date).or_insert(0) += entry.article_count;
    }
    by_date
        .into_iter()
        .map(|(date, article_count)| TimelineEntry { date, article_count, velocity: article_count as f64 })
        .collect()
}

/// Shared Extend/Reactivate/merge tail: derives the new lifecycle state
/// from `updated`'s current content fields, records history only when the
/// state actually changes (or a reactivation, which always logs), and
/// re-derives the fingerprint hash from the post-merge actor/action sets.
pub(crate) fn apply_lifecycle_derivation(updated: &mut Narrative, prior_state: LifecycleState, now: DateTime<Utc>, reactivating: bool) {
    let (articles_24h, velocity_rising, articles_7d, hours_silent) = activity_stats(updated, now);
    let next = lifecycle::next_state(prior_state, articles_24h, velocity_rising, articles_7d, hours_silent);

    updated.velocity = articles_24h as f64;
    updated.lifecycle_state = next;
    updated.dormant_since = if next == LifecycleState::Dormant { Some(now) } else { updated.dormant_since };

    if next != prior_state || reactivating {
        updated.lifecycle_history.push(LifecycleHistoryEntry {
            state: next,
            entered_at: now,
            article_count_at_entry: updated.article_count,
        });
    }

    updated.fingerprint = NarrativeFingerprint::new(
        updated.nucleus_entity.clone(),
        updated.narrative_focus.clone(),
        updated.top_actors.clone(),
        updated.key_actions.clone(),
        now,
    );
}

fn sentiment_score(article: &Article) -> f32 {
    match article.sentiment {
        narrative_common::types::Sentiment::Pos => 1.0,
        narrative_common::types::Sentiment::Neg => -1.0,
        narrative_common::types::Sentiment::Neu => 0.0,
    }
}

fn update_timeline(narrative: &mut Narrative, now: DateTime<Utc>) {
    let today = now.date_naive();
    if let Some(entry) = narrative.timeline_data.iter_mut().find(|e| e.date == today) {
        entry.article_count += 1;
    } else {
        narrative.timeline_data.push(TimelineEntry { date: today, article_count: 1, velocity: 0.0 });
    }
    narrative.timeline_data.sort_by_key(|e| e.date);
    for entry in &mut narrative.timeline_data {
        entry.velocity = entry.article_count as f64;
    }
}

/// Derives the four inputs `lifecycle::next_state` needs from the
/// narrative's own timeline bucket and `last_article_at`, since the engine
/// has no separate activity feed to query (§4.C8 leaves the source of these
/// counters to the implementation).
fn activity_stats(narrative: &Narrative, now: DateTime<Utc>) -> (u32, bool, u32, f64) {
    let today = now.date_naive();
    let yesterday = today - Duration::days(1);

    let articles_24h = narrative
        .timeline_data
        .iter()
        .find(|e| e.date == today)
        .map(|e| e.article_count as u32)
        .unwrap_or(0);

    let prior_24h = narrative
        .timeline_data
        .iter()
        .find(|e| e.date == yesterday)
        .map(|e| e.article_count as u32)
        .unwrap_or(0);

    let articles_7d: u32 = narrative
        .timeline_data
        .iter()
        .filter(|e| e.date >= today - Duration::days(6))
        .map(|e| e.article_count as u32)
        .sum();

    let velocity_rising = articles_24h > prior_24h;
    let hours_silent = (now - narrative.last_article_at).num_minutes() as f64 / 60.0;

    (articles_24h, velocity_rising, articles_7d, hours_silent)
}
