use chrono::{Duration, Utc};
use narrative_common::error::MatcherResult;
use narrative_common::types::{ArticleFingerprint, Narrative, NarrativeId};
use narrative_store::narratives::NarrativeStore;

use crate::similarity::{self, EXTEND_THRESHOLD, REACTIVATE_THRESHOLD, REACTIVATION_WINDOW_DAYS};

const CANDIDATE_WINDOW_DAYS: i64 = 90;

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Extend { narrative_id: NarrativeId, similarity: f64 },
    Reactivate { narrative_id: NarrativeId, similarity: f64, dormant_days: i64 },
    CreateNew,
}

pub struct NarrativeMatcher {
    store: NarrativeStore,
}

impl NarrativeMatcher {
    pub fn new(store: NarrativeStore) -> Self {
        Self { store }
    }

    /// §4.C7 decision algorithm. Fails only on persistence I/O; a
    /// fingerprint with missing fields never errors, it degrades to
    /// `CreateNew` (step 1: no nucleus means no candidate pool to query).
    pub async fn match_fingerprint(&self, fingerprint: &ArticleFingerprint) -> MatcherResult<Decision> {
        let Some(nucleus) = fingerprint.nucleus_entity.as_deref() else {
            return Ok(Decision::CreateNew);
        };

        let since = Utc::now() - Duration::days(CANDIDATE_WINDOW_DAYS);
        let candidates = self.store.candidates_by_nucleus(nucleus, since).await?;

        let reactivation_cutoff = Utc::now() - Duration::days(REACTIVATION_WINDOW_DAYS);

        let mut active: Vec<(Narrative, f64)> = Vec::new();
        let mut dormant: Vec<(Narrative, f64)> = Vec::new();

        for narrative in candidates {
            let is_dormant = narrative.lifecycle_state == narrative_common::types::LifecycleState::Dormant;
            if is_dormant {
                let Some(dormant_since) = narrative.dormant_since else { continue };
                if dormant_since < reactivation_cutoff {
                    continue;
                }
            }

            let candidate_nucleus = &narrative.nucleus_entity;
            let existing_fp = ArticleFingerprint {
                nucleus_entity: Some(candidate_nucleus.clone()),
                narrative_focus: Some(narrative.narrative_focus.clone()),
                top_actors: narrative.top_actors.clone(),
                key_actions: narrative.key_actions.clone(),
            };

            let sim = similarity::similarity(fingerprint, nucleus, &existing_fp, candidate_nucleus);
            if sim <= 0.0 {
                continue;
            }

            if is_dormant {
                dormant.push((narrative, sim));
            } else {
                active.push((narrative, sim));
            }
        }

        if let Some((narrative, sim)) = argmax_by_sim_then_recency(&active, EXTEND_THRESHOLD) {
            return Ok(Decision::Extend { narrative_id: narrative.id.clone(), similarity: sim });
        }

        if let Some((narrative, sim)) = argmax_by_sim_then_recency(&dormant, REACTIVATE_THRESHOLD) {
            let dormant_since = narrative.dormant_since.unwrap_or(Utc::now());
            let dormant_days = (Utc::now() - dormant_since).num_days();
            return Ok(Decision::Reactivate {
                narrative_id: narrative.id.clone(),
                similarity: sim,
                dormant_days,
            });
        }

        Ok(Decision::CreateNew)
    }
}

/// Argmax with a `≥` threshold (documented defect fix, §4.C7), ties
/// broken by highest `last_article_at`.
fn argmax_by_sim_then_recency(candidates: &[(Narrative, f64)], threshold: f64) -> Option<(&Narrative, f64)> {
    candidates
        .iter()
        .filter(|(_, sim)| *sim >= threshold)
        .max_by(|(na, sa), (nb, sb)| {
            sa.partial_cmp(sb)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(na.last_article_at.cmp(&nb.last_article_at))
        })
        .map(|(n, s)| (n, *s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrative_common::types::{LifecycleState, NarrativeFingerprint};

    fn narrative(id: &str, nucleus: &str, focus: &str, actors: &[&str], state: LifecycleState, last_article_at: chrono::DateTime<Utc>) -> Narrative {
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
            article_ids: vec!["a1".into()],
            article_count: 1,
            first_seen: now,
            last_updated: now,
            last_article_at,
            lifecycle_state: state,
            dormant_since: if state == LifecycleState::Dormant { Some(now) } else { None },
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
    fn argmax_respects_ge_threshold_boundary() {
        let n = narrative("n1", "Bitcoin", "price surge", &["Bitcoin"], LifecycleState::Rising, Utc::now());
        let candidates = vec![(n, 0.60)];
        assert!(argmax_by_sim_then_recency(&candidates, 0.60).is_some());
    }

    #[test]
    fn argmax_excludes_below_threshold() {
        let n = narrative("n1", "Bitcoin", "price surge", &["Bitcoin"], LifecycleState::Rising, Utc::now());
        let candidates = vec![(n, 0.599)];
        assert!(argmax_by_sim_then_recency(&candidates, 0.60).is_none());
    }

    #[test]
    fn argmax_tie_break_prefers_most_recent_article() {
        let older = Utc::now() - Duration::days(2);
        let newer = Utc::now();
        let n1 = narrative("n1", "Bitcoin", "x", &[], LifecycleState::Rising, older);
        let n2 = narrative("n2", "Bitcoin", "x", &[], LifecycleState::Rising, newer);
        let candidates = vec![(n1, 0.7), (n2, 0.7)];
        let (winner, _) = argmax_by_sim_then_recency(&candidates, 0.6).unwrap();
        assert_eq!(winner.id, "n2");
    }
}
