use narrative_common::types::Narrative;
use narrative_common::util::{jaccard, slugify};

const FUZZY_FOCUS_THRESHOLD: f64 = 0.7;

/// Recommendation-narrative linkage (§4.C10): normalized-title equality
/// first, then fuzzy focus-similarity at or above the threshold. No match
/// leaves `narrative_id` null — the frontend is expected to handle that.
pub fn match_narrative<'a>(hint: Option<&str>, candidates: &'a [Narrative]) -> Option<&'a Narrative> {
    let hint = hint?;
    let normalized_hint = slugify(hint);

    if let Some(exact) = candidates.iter().find(|n| slugify(&n.title) == normalized_hint) {
        return Some(exact);
    }

    candidates
        .iter()
        .map(|n| (n, jaccard(&n.narrative_focus, hint)))
        .filter(|(_, score)| *score >= FUZZY_FOCUS_THRESHOLD)
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(n, _)| n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use narrative_common::types::{LifecycleState, NarrativeFingerprint};

    fn narrative(title: &str, focus: &str) -> Narrative {
        let now = Utc::now();
        Narrative {
            id: title.to_string(),
            title: title.to_string(),
            summary: String::new(),
            nucleus_entity: "Bitcoin".into(),
            narrative_focus: focus.to_string(),
            top_actors: vec![],
            key_actions: vec![],
            entities: vec![],
            article_ids: vec![],
            article_count: 0,
            first_seen: now,
            last_updated: now,
            last_article_at: now,
            lifecycle_state: LifecycleState::Rising,
            dormant_since: None,
            reactivated_count: 0,
            lifecycle_history: vec![],
            fingerprint: NarrativeFingerprint::new("Bitcoin".into(), focus.to_string(), vec![], vec![], now),
            avg_sentiment: 0.0,
            velocity: 0.0,
            timeline_data: vec![],
            archived: false,
        }
    }

    #[test]
    fn exact_normalized_title_match_wins() {
        let candidates = vec![narrative("Bitcoin Price Surge", "price surge")];
        let matched = match_narrative(Some("bitcoin price surge"), &candidates);
        assert_eq!(matched.unwrap().id, "Bitcoin Price Surge");
    }

    #[test]
    fn fuzzy_focus_match_above_threshold() {
        let candidates = vec![narrative("Something Else", "bitcoin etf price surge rally")];
        let matched = match_narrative(Some("bitcoin etf price surge"), &candidates);
        assert!(matched.is_some());
    }

    #[test]
    fn no_match_returns_none() {
        let candidates = vec![narrative("Ethereum Upgrade", "network upgrade")];
        let matched = match_narrative(Some("completely unrelated topic"), &candidates);
        assert!(matched.is_none());
    }

    #[test]
    fn missing_hint_returns_none() {
        let candidates = vec![narrative("Ethereum Upgrade", "network upgrade")];
        assert!(match_narrative(None, &candidates).is_none());
    }
}
