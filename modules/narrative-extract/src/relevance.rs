use narrative_common::types::RelevanceTier;
use regex::Regex;

/// Rule-based pre-filter (§4.C5): a cheap 3-tier score computed before any
/// LLM call is considered. Tier 1 articles are clearly on-topic; tier 3
/// articles are kept (never dropped — the pipeline still persists
/// everything per §7) but rarely warrant the LLM extraction pass.
pub struct RelevanceClassifier {
    strong: Vec<Regex>,
    weak: Vec<Regex>,
}

impl RelevanceClassifier {
    pub fn new() -> Self {
        let strong_patterns = [
            r"(?i)\bbitcoin\b",
            r"(?i)\bethereum\b",
            r"(?i)\bsec\b.*\b(enforcement|lawsuit|filing)\b",
            r"(?i)\betf\b",
            r"\$[A-Z]{2,6}\b",
            r"(?i)\b(blockchain|defi|stablecoin)\b",
        ];
        let weak_patterns = [
            r"(?i)\bcrypto\w*\b",
            r"(?i)\bmarket\b",
            r"(?i)\bregulat\w*\b",
            r"(?i)\btoken\b",
        ];

        Self {
            strong: strong_patterns
                .iter()
                .map(|p| Regex::new(p).expect("valid strong relevance pattern"))
                .collect(),
            weak: weak_patterns
                .iter()
                .map(|p| Regex::new(p).expect("valid weak relevance pattern"))
                .collect(),
        }
    }

    /// Score title+body against the pattern lists. Two or more strong
    /// hits (or one strong hit plus a weak one) is tier 1; a single
    /// strong hit or multiple weak hits is tier 2; anything else is
    /// tier 3 but still persisted, never discarded.
    pub fn classify(&self, title: &str, body: &str) -> RelevanceTier {
        let text = format!("{title} {body}");

        let strong_hits = self.strong.iter().filter(|re| re.is_match(&text)).count();
        let weak_hits = self.weak.iter().filter(|re| re.is_match(&text)).count();

        if strong_hits >= 2 || (strong_hits >= 1 && weak_hits >= 1) {
            RelevanceTier::One
        } else if strong_hits >= 1 || weak_hits >= 2 {
            RelevanceTier::Two
        } else {
            RelevanceTier::Three
        }
    }
}

impl Default for RelevanceClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_strong_double_hit_is_tier_one() {
        let c = RelevanceClassifier::new();
        assert_eq!(
            c.classify("Bitcoin ETF approved", "details on the blockchain filing"),
            RelevanceTier::One
        );
    }

    #[test]
    fn classify_single_strong_hit_is_tier_two() {
        let c = RelevanceClassifier::new();
        assert_eq!(c.classify("Ethereum update", "nothing else relevant here"), RelevanceTier::Two);
    }

    #[test]
    fn classify_weak_only_double_hit_is_tier_two() {
        let c = RelevanceClassifier::new();
        assert_eq!(
            c.classify("Market regulation news", "crypto regulators are watching the market"),
            RelevanceTier::Two
        );
    }

    #[test]
    fn classify_no_hits_is_tier_three() {
        let c = RelevanceClassifier::new();
        assert_eq!(c.classify("Local weather report", "sunny with a chance of rain"), RelevanceTier::Three);
    }

    #[test]
    fn classify_ticker_pattern_counts_as_strong() {
        let c = RelevanceClassifier::new();
        assert_eq!(c.classify("$BTC rallies", "price action continues"), RelevanceTier::Two);
    }
}
