use std::collections::HashSet;

/// Lowercase, whitespace-split token set — the basis for Jaccard overlap
/// used throughout the matcher.
pub fn token_set(s: &str) -> HashSet<String> {
    s.to_lowercase()
        .split_whitespace()
        .map(|t| t.to_string())
        .collect()
}

/// Jaccard similarity over whitespace tokens, case-insensitive.
///
/// ```
/// use narrative_common::util::jaccard;
/// assert_eq!(jaccard("price surge", "price surge"), 1.0);
/// ```
pub fn jaccard(a: &str, b: &str) -> f64 {
    let sa = token_set(a);
    let sb = token_set(b);
    if sa.is_empty() && sb.is_empty() {
        return 1.0;
    }
    let intersection = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// `|A∩B| / max(|A|,|B|)` on string sets, 0 if either side is empty —
/// the overlap measure used for `actors_sim`/`actions_sim` per §4.C7.
pub fn containment(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let sa: HashSet<&str> = a.iter().map(|s| s.as_str()).collect();
    let sb: HashSet<&str> = b.iter().map(|s| s.as_str()).collect();
    let intersection = sa.intersection(&sb).count();
    let denom = sa.len().max(sb.len());
    intersection as f64 / denom as f64
}

/// Normalize a ticker mention (`btc` -> `$BTC`) per §4.C6.
pub fn normalize_ticker(raw: &str) -> String {
    let stripped = raw.trim_start_matches('$');
    format!("${}", stripped.to_uppercase())
}

/// Canonicalize a handful of well-known project names; anything unknown
/// passes through with title-case applied to the first letter only,
/// since full title-casing would mangle acronyms like "SEC".
pub fn canonicalize_project(raw: &str) -> String {
    let lower = raw.to_lowercase();
    match lower.as_str() {
        "bitcoin" | "btc" => "Bitcoin".to_string(),
        "ethereum" | "eth" => "Ethereum".to_string(),
        "solana" | "sol" => "Solana".to_string(),
        "ripple" | "xrp" => "Ripple".to_string(),
        _ => raw.to_string(),
    }
}

/// Generate a URL-ish slug for synthetic IDs in admin tooling and tests.
pub fn slugify(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jaccard_identical_strings_is_one() {
        assert_eq!(jaccard("enforcement action", "enforcement action"), 1.0);
    }

    #[test]
    fn jaccard_disjoint_strings_is_zero() {
        assert_eq!(jaccard("price surge", "governance dispute"), 0.0);
    }

    #[test]
    fn jaccard_partial_overlap() {
        // "enforcement action" vs "enforcement actions" -> intersection 1, union 3
        let sim = jaccard("enforcement action", "enforcement actions");
        assert!((sim - (1.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn jaccard_is_symmetric() {
        assert_eq!(
            jaccard("a b c", "b c d"),
            jaccard("b c d", "a b c"),
        );
    }

    #[test]
    fn containment_empty_side_is_zero() {
        assert_eq!(containment(&[], &["x".to_string()]), 0.0);
    }

    #[test]
    fn containment_full_overlap_smaller_set() {
        let a = vec!["Bitcoin".to_string(), "ETF".to_string()];
        let b = vec!["Bitcoin".to_string()];
        assert_eq!(containment(&a, &b), 1.0);
    }

    #[test]
    fn containment_two_of_three() {
        let a = vec!["Bitcoin".to_string(), "ETF".to_string(), "BlackRock".to_string()];
        let b = vec!["Bitcoin".to_string(), "BlackRock".to_string()];
        assert!((containment(&a, &b) - (2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn normalize_ticker_lowercase_input() {
        assert_eq!(normalize_ticker("btc"), "$BTC");
    }

    #[test]
    fn normalize_ticker_already_prefixed() {
        assert_eq!(normalize_ticker("$eth"), "$ETH");
    }

    #[test]
    fn canonicalize_project_known_alias() {
        assert_eq!(canonicalize_project("bitcoin"), "Bitcoin");
    }

    #[test]
    fn canonicalize_project_unknown_passthrough() {
        assert_eq!(canonicalize_project("SEC"), "SEC");
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Bitcoin: Price Surge!!"), "bitcoin-price-surge");
    }
}
