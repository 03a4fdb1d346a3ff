use narrative_common::types::ArticleFingerprint;
use narrative_common::util::{containment, jaccard};

pub const EXTEND_THRESHOLD: f64 = 0.60;
pub const REACTIVATE_THRESHOLD: f64 = 0.80;
pub const REACTIVATION_WINDOW_DAYS: i64 = 30;
/// Stricter threshold used only by the periodic consolidation pass
/// (§4.C8), never by live matching.
pub const CONSOLIDATION_THRESHOLD: f64 = 0.85;

/// Hard pre-gate (§4.C7): a candidate pair is even considered only if the
/// focus strings match case-insensitively, or the nucleus entities match
/// exactly. This blocks spurious matches built from weak overlapping
/// signals alone.
pub fn passes_hard_gate(focus_a: Option<&str>, nucleus_a: &str, focus_b: Option<&str>, nucleus_b: &str) -> bool {
    let focus_match = match (focus_a, focus_b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    };
    let nucleus_match = nucleus_a == nucleus_b;
    focus_match || nucleus_match
}

fn focus_sim(focus_a: Option<&str>, focus_b: Option<&str>) -> f64 {
    match (focus_a, focus_b) {
        (Some(a), Some(b)) if !a.trim().is_empty() && !b.trim().is_empty() => {
            let overlap = jaccard(a, b);
            if a.eq_ignore_ascii_case(b) {
                1.0
            } else if overlap > 0.8 {
                0.9
            } else if overlap > 0.5 {
                0.7
            } else {
                0.0
            }
        }
        // Missing/empty focus on either side: neutral contribution (§4.C7).
        _ => 0.5,
    }
}

fn nucleus_sim(nucleus_a: &str, nucleus_b: &str) -> f64 {
    if nucleus_a == nucleus_b {
        1.0
    } else {
        0.0
    }
}

/// Weighted similarity per §4.C7:
/// `sim = 0.5·focus_sim + 0.3·nucleus_sim + 0.1·actors_sim + 0.1·actions_sim`.
/// Returns 0 without computing anything else if the hard gate fails.
pub fn similarity(a: &ArticleFingerprint, nucleus_a: &str, b: &ArticleFingerprint, nucleus_b: &str) -> f64 {
    if !passes_hard_gate(a.narrative_focus.as_deref(), nucleus_a, b.narrative_focus.as_deref(), nucleus_b) {
        return 0.0;
    }

    let focus = focus_sim(a.narrative_focus.as_deref(), b.narrative_focus.as_deref());
    let nucleus = nucleus_sim(nucleus_a, nucleus_b);
    let actors = containment(&a.top_actors, &b.top_actors);
    let actions = containment(&a.key_actions, &b.key_actions);

    0.5 * focus + 0.3 * nucleus + 0.1 * actors + 0.1 * actions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(focus: &str, actors: &[&str], actions: &[&str]) -> ArticleFingerprint {
        ArticleFingerprint {
            nucleus_entity: None,
            narrative_focus: Some(focus.to_string()),
            top_actors: actors.iter().map(|s| s.to_string()).collect(),
            key_actions: actions.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn sim_identical_is_one() {
        let a = fp("price surge", &["Bitcoin", "ETF"], &["approved"]);
        let b = a.clone();
        assert_eq!(similarity(&a, "Bitcoin", &b, "Bitcoin"), 1.0);
    }

    #[test]
    fn sim_is_symmetric() {
        let a = fp("enforcement action", &["SEC", "Ripple"], &["filed"]);
        let b = fp("enforcement move", &["Ripple"], &[]);
        let ab = similarity(&a, "SEC", &b, "SEC");
        let ba = similarity(&b, "SEC", &a, "SEC");
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn sim_zero_when_hard_gate_fails_regardless_of_overlap() {
        let a = fp("price surge", &["Bitcoin", "ETF", "BlackRock"], &["approved"]);
        let b = fp("governance dispute", &["Bitcoin", "ETF", "BlackRock"], &["approved"]);
        assert_eq!(similarity(&a, "Bitcoin", &b, "Ethereum"), 0.0);
    }

    #[test]
    fn sim_extend_on_same_day_scenario() {
        // §8 scenario 1: 0.5*1.0 + 0.3*1.0 + 0.1*(2/3) + 0.1*0 = 0.867
        let existing = fp("price surge", &["Bitcoin", "ETF", "BlackRock"], &[]);
        let candidate = fp("price surge", &["Bitcoin", "BlackRock"], &[]);
        let sim = similarity(&existing, "Bitcoin", &candidate, "Bitcoin");
        assert!((sim - 0.8667).abs() < 0.001);
    }

    #[test]
    fn sim_story_split_scenario() {
        // §8 scenario 2: nucleus matches, focus disjoint -> 0.30
        let existing = fp("price surge", &["Bitcoin", "ETF"], &[]);
        let candidate = fp("governance dispute", &["SEC"], &[]);
        let sim = similarity(&existing, "Bitcoin", &candidate, "Bitcoin");
        assert!((sim - 0.30).abs() < 1e-9);
    }

    #[test]
    fn sim_empty_focus_both_sides_same_nucleus_no_actors() {
        // §8 boundary: 0.5*0.5 + 0.3*1 + 0 + 0 = 0.55
        let a = ArticleFingerprint {
            nucleus_entity: None,
            narrative_focus: None,
            top_actors: vec![],
            key_actions: vec![],
        };
        let b = a.clone();
        let sim = similarity(&a, "Bitcoin", &b, "Bitcoin");
        assert!((sim - 0.55).abs() < 1e-9);
        assert!(sim < EXTEND_THRESHOLD, "must fall below Extend threshold by design");
    }

    #[test]
    fn sim_consolidation_below_threshold_scenario() {
        // §8 scenario 5: focus jaccard = 2/3 -> focus_sim=0.7, nucleus=1.0,
        // actors_sim=1.0, actions_sim=1/3 -> 0.5*0.7+0.3*1.0+0.1*1.0+0.1*(1/3) ~= 0.7833, below 0.85
        let a = fp("enforcement action update", &["x"], &["a"]);
        let b = fp("enforcement action", &["x"], &["a", "b", "c"]);
        let sim = similarity(&a, "SEC", &b, "SEC");
        assert!(sim < CONSOLIDATION_THRESHOLD);
        assert!((sim - 0.78).abs() < 0.01);
    }

    #[test]
    fn focus_sim_exact_match_is_one() {
        assert_eq!(focus_sim(Some("price surge"), Some("Price Surge")), 1.0);
    }

    #[test]
    fn focus_sim_missing_is_neutral() {
        assert_eq!(focus_sim(None, Some("price surge")), 0.5);
    }

    #[test]
    fn passes_hard_gate_on_focus_match_alone() {
        assert!(passes_hard_gate(Some("price surge"), "Bitcoin", Some("Price Surge"), "Ethereum"));
    }

    #[test]
    fn passes_hard_gate_on_nucleus_match_alone() {
        assert!(passes_hard_gate(None, "Bitcoin", None, "Bitcoin"));
    }

    #[test]
    fn passes_hard_gate_fails_without_either() {
        assert!(!passes_hard_gate(Some("a"), "Bitcoin", Some("b"), "Ethereum"));
    }
}
