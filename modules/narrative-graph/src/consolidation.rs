use std::collections::HashMap;

use chrono::Utc;
use narrative_common::error::NarrativeResult;
use narrative_common::types::{ArticleFingerprint, Narrative};
use narrative_store::narratives::NarrativeStore;
use tracing::info;

use crate::engine::{self, MAX_KEY_ACTIONS, MAX_TOP_ACTORS};
use crate::similarity::{self, CONSOLIDATION_THRESHOLD};

const MAX_MERGES_PER_PASS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct MergeDecision {
    pub survivor_id: String,
    pub absorbed_id: String,
    pub similarity: f64,
}

/// Operator-facing summary of a consolidation pass, for the admin CLI and
/// worker logs alongside the per-pair `MergeDecision` log lines.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConsolidationStats {
    pub candidates_considered: usize,
    pub merges: usize,
    pub dry_run: bool,
}

impl std::fmt::Display for ConsolidationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Consolidation {} ===", if self.dry_run { "Dry Run" } else { "Complete" })?;
        writeln!(f, "Candidates considered: {}", self.candidates_considered)?;
        writeln!(f, "Merges {}:         {}", if self.dry_run { "proposed" } else { "applied" }, self.merges)?;
        Ok(())
    }
}

/// Periodic pass (§4.C8): narratives that independently crossed the
/// `EXTEND_THRESHOLD` gate from different directions sometimes end up as
/// separate rows describing the same story. This groups same-nucleus active
/// narratives, merges pairs scoring at or above `CONSOLIDATION_THRESHOLD`,
/// and caps itself at `MAX_MERGES_PER_PASS` so one run can't rewrite the
/// whole table. Idempotent: archived narratives are excluded from the next
/// run's candidate pool.
pub struct Consolidator {
    store: NarrativeStore,
}

impl Consolidator {
    pub fn new(store: NarrativeStore) -> Self {
        Self { store }
    }

    pub async fn run(&self) -> NarrativeResult<Vec<MergeDecision>> {
        let (decisions, _) = self.run_with_stats(false).await?;
        Ok(decisions)
    }

    /// Same pass, but `dry_run: true` skips the actual `try_update`/archive
    /// writes and only reports what would have merged — the backing for
    /// the CLI's consolidation dry-run script.
    pub async fn run_with_stats(&self, dry_run: bool) -> NarrativeResult<(Vec<MergeDecision>, ConsolidationStats)> {
        let active = self.store.list_all_active_for_consolidation().await?;
        let candidates_considered = active.len();

        let mut by_nucleus: HashMap<String, Vec<Narrative>> = HashMap::new();
        for narrative in active {
            by_nucleus.entry(narrative.nucleus_entity.clone()).or_default().push(narrative);
        }

        let mut decisions = Vec::new();

        'groups: for (_, mut group) in by_nucleus {
            if group.len() < 2 {
                continue;
            }
            group.sort_by(|a, b| b.article_count.cmp(&a.article_count).then_with(|| a.first_seen.cmp(&b.first_seen)));

            let mut absorbed: Vec<usize> = Vec::new();
            for i in 0..group.len() {
                if decisions.len() >= MAX_MERGES_PER_PASS {
                    break 'groups;
                }
                if absorbed.contains(&i) {
                    continue;
                }
                for j in (i + 1)..group.len() {
                    if absorbed.contains(&j) {
                        continue;
                    }
                    let sim = pair_similarity(&group[i], &group[j]);
                    if sim >= CONSOLIDATION_THRESHOLD {
                        let survivor = &group[i];
                        let absorbed_narrative = &group[j];
                        info!(
                            survivor = %survivor.id,
                            absorbed = %absorbed_narrative.id,
                            similarity = sim,
                            "consolidating duplicate narrative"
                        );
                        if !dry_run {
                            self.merge(survivor, absorbed_narrative).await?;
                        }
                        decisions.push(MergeDecision {
                            survivor_id: survivor.id.clone(),
                            absorbed_id: absorbed_narrative.id.clone(),
                            similarity: sim,
                        });
                        absorbed.push(j);
                        if decisions.len() >= MAX_MERGES_PER_PASS {
                            break 'groups;
                        }
                    }
                }
            }
        }

        let stats = ConsolidationStats { candidates_considered, merges: decisions.len(), dry_run };
        Ok((decisions, stats))
    }

    /// Absorbs `absorbed` into `survivor`. Re-runs Extend semantics (§4.C8
    /// step 3) against the union of both narratives' content rather than
    /// hand-copying a handful of fields: actor/action lists dedup-and-cap
    /// the same way a new article's fingerprint does, `avg_sentiment`
    /// becomes the article-count-weighted mean of both sides, timelines sum
    /// by date, and `apply_lifecycle_derivation` re-evaluates lifecycle
    /// state and the fingerprint hash from the merged result.
    async fn merge(&self, survivor: &Narrative, absorbed: &Narrative) -> NarrativeResult<()> {
        let Some(mut merged) = self.store.get_by_id(&survivor.id).await? else {
            return Ok(());
        };
        let Some(mut loser) = self.store.get_by_id(&absorbed.id).await? else {
            return Ok(());
        };
        let expected = merged.last_updated;
        let now = Utc::now();
        let prior_state = merged.lifecycle_state;

        for id in &loser.article_ids {
            if !merged.article_ids.contains(id) {
                merged.article_ids.push(id.clone());
            }
        }
        let survivor_count = merged.article_count as f32;
        let loser_count = loser.article_count as f32;
        merged.article_count = merged.article_ids.len();

        for entity in &loser.entities {
            if !merged.entities.iter().any(|e| e.eq_ignore_ascii_case(entity)) {
                merged.entities.push(entity.clone());
            }
        }
        merged.top_actors = engine::merge_capped(merged.top_actors, &loser.top_actors, MAX_TOP_ACTORS);
        merged.key_actions = engine::merge_capped(merged.key_actions, &loser.key_actions, MAX_KEY_ACTIONS);

        let total_count = survivor_count + loser_count;
        if total_count > 0.0 {
            merged.avg_sentiment = ((merged.avg_sentiment * survivor_count) + (loser.avg_sentiment * loser_count)) / total_count;
        }

        merged.last_article_at = merged.last_article_at.max(loser.last_article_at);
        merged.timeline_data = engine::merge_timeline_data(&merged.timeline_data, &loser.timeline_data);

        engine::apply_lifecycle_derivation(&mut merged, prior_state, now, false);
        merged.last_updated = now;

        self.store.try_update(&merged, expected).await?;

        let loser_expected = loser.last_updated;
        loser.archived = true;
        loser.last_updated = now;
        self.store.try_update(&loser, loser_expected).await?;

        Ok(())
    }
}

fn pair_similarity(a: &Narrative, b: &Narrative) -> f64 {
    let fp_a = ArticleFingerprint {
        nucleus_entity: Some(a.nucleus_entity.clone()),
        narrative_focus: Some(a.narrative_focus.clone()),
        top_actors: a.top_actors.clone(),
        key_actions: a.key_actions.clone(),
    };
    let fp_b = ArticleFingerprint {
        nucleus_entity: Some(b.nucleus_entity.clone()),
        narrative_focus: Some(b.narrative_focus.clone()),
        top_actors: b.top_actors.clone(),
        key_actions: b.key_actions.clone(),
    };
    similarity::similarity(&fp_a, &a.nucleus_entity, &fp_b, &b.nucleus_entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrative_common::types::{LifecycleState, NarrativeFingerprint};

    fn narrative(id: &str, nucleus: &str, focus: &str, actors: &[&str], count: usize) -> Narrative {
        let now = Utc::now();
        Narrative {
            id: id.to_string(),
            title: String::new(),
            summary: String::new(),
            nucleus_entity: nucleus.to_string(),
            narrative_focus: focus.to_string(),
            top_actors: actors.iter().map(|s| s.to_string()).collect(),
            key_actions: vec![],
            entities: vec![],
            article_ids: (0..count).map(|i| format!("a{i}")).collect(),
            article_count: count,
            first_seen: now,
            last_updated: now,
            last_article_at: now,
            lifecycle_state: LifecycleState::Rising,
            dormant_since: None,
            reactivated_count: 0,
            lifecycle_history: vec![],
            fingerprint: NarrativeFingerprint::new(nucleus.to_string(), focus.to_string(), actors.iter().map(|s| s.to_string()).collect(), vec![], now),
            avg_sentiment: 0.0,
            velocity: 1.0,
            timeline_data: vec![],
            archived: false,
        }
    }

    #[test]
    fn pair_similarity_matches_direct_similarity_call() {
        let a = narrative("n1", "Bitcoin", "price surge", &["Bitcoin", "ETF"], 5);
        let b = narrative("n2", "Bitcoin", "price surge", &["Bitcoin"], 2);
        assert!(pair_similarity(&a, &b) >= CONSOLIDATION_THRESHOLD);
    }

    #[test]
    fn pair_similarity_below_threshold_for_different_focus() {
        let a = narrative("n1", "Bitcoin", "price surge", &["Bitcoin"], 5);
        let b = narrative("n2", "Ethereum", "network upgrade", &["Ethereum"], 2);
        assert!(pair_similarity(&a, &b) < CONSOLIDATION_THRESHOLD);
    }
}
