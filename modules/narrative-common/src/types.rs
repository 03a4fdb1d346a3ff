use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub type ArticleId = String;
pub type NarrativeId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelevanceTier {
    /// Tier 1: clearly relevant, passed the classifier's strongest rules.
    One = 1,
    /// Tier 2: ambiguous, worth an LLM pass.
    Two = 2,
    /// Tier 3: weak relevance, kept for completeness but rarely enriched.
    Three = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Pos,
    Neg,
    Neu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Llm,
    Rule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Ticker,
    Project,
    Person,
    Organization,
    Event,
    Concept,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
    pub fingerprint: String,
    pub relevance_tier: RelevanceTier,
    pub entities: Vec<ExtractedEntity>,
    pub sentiment: Sentiment,
    pub narrative_id: Option<NarrativeId>,
    pub extraction_method: ExtractionMethod,
    pub created_at: DateTime<Utc>,
}

impl Article {
    /// `fingerprint` per §3: sha256 of normalized title+body, hex-encoded.
    /// Normalization lowercases and collapses whitespace so trivial
    /// formatting differences don't defeat dedup.
    pub fn compute_fingerprint(title: &str, body: &str) -> String {
        let normalized = format!(
            "{}|{}",
            normalize_for_fingerprint(title),
            normalize_for_fingerprint(body)
        );
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn normalize_for_fingerprint(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The matcher's input shape (§4.C7): derived from a freshly-enriched
/// article, not persisted on its own — it's consumed immediately by
/// `match()` and folded into a `NarrativeFingerprint` on Extend/Create.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleFingerprint {
    pub nucleus_entity: Option<String>,
    pub narrative_focus: Option<String>,
    pub top_actors: Vec<String>,
    pub key_actions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Emerging,
    Rising,
    Hot,
    Cooling,
    Dormant,
    Reactivated,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Emerging => "emerging",
            LifecycleState::Rising => "rising",
            LifecycleState::Hot => "hot",
            LifecycleState::Cooling => "cooling",
            LifecycleState::Dormant => "dormant",
            LifecycleState::Reactivated => "reactivated",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleHistoryEntry {
    pub state: LifecycleState,
    pub entered_at: DateTime<Utc>,
    pub article_count_at_entry: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub date: chrono::NaiveDate,
    pub article_count: usize,
    pub velocity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeFingerprint {
    pub nucleus_entity: String,
    pub narrative_focus: String,
    pub top_actors: Vec<String>,
    pub key_actions: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub hash: String,
}

impl NarrativeFingerprint {
    /// `hash` per §3: sha1-style content hash of nucleus + sorted top_actors.
    /// We use sha256 (sha1 is not in the workspace's dependency stack and
    /// offers nothing extra here); only determinism under nucleus/actors is
    /// actually required by the invariant.
    pub fn compute_hash(nucleus_entity: &str, top_actors: &[String]) -> String {
        let mut sorted = top_actors.to_vec();
        sorted.sort();
        let joined = format!("{}|{}", nucleus_entity.to_lowercase(), sorted.join(","));
        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn new(
        nucleus_entity: String,
        narrative_focus: String,
        top_actors: Vec<String>,
        key_actions: Vec<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let hash = Self::compute_hash(&nucleus_entity, &top_actors);
        Self {
            nucleus_entity,
            narrative_focus,
            top_actors,
            key_actions,
            timestamp,
            hash,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Narrative {
    pub id: NarrativeId,
    pub title: String,
    pub summary: String,
    pub nucleus_entity: String,
    pub narrative_focus: String,
    pub top_actors: Vec<String>,
    pub key_actions: Vec<String>,
    pub entities: Vec<String>,
    pub article_ids: Vec<ArticleId>,
    pub article_count: usize,
    pub first_seen: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub last_article_at: DateTime<Utc>,
    pub lifecycle_state: LifecycleState,
    pub dormant_since: Option<DateTime<Utc>>,
    pub reactivated_count: u32,
    pub lifecycle_history: Vec<LifecycleHistoryEntry>,
    pub fingerprint: NarrativeFingerprint,
    pub avg_sentiment: f32,
    pub velocity: f64,
    pub timeline_data: Vec<TimelineEntry>,
    /// Set when a later consolidation pass merges this narrative into a
    /// survivor. Archived narratives are never deleted, only hidden from
    /// active reads.
    pub archived: bool,
}

impl Narrative {
    /// Invariant #1 and #6 from §8: article_count tracks the deduped id set.
    pub fn article_count_matches(&self) -> bool {
        let mut ids = self.article_ids.clone();
        ids.sort();
        ids.dedup();
        self.article_count == ids.len() && ids.len() == self.article_ids.len()
    }

    /// Invariant #3 from §8.
    pub fn dormant_invariant_holds(&self) -> bool {
        (self.lifecycle_state == LifecycleState::Dormant) == self.dormant_since.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalNarrativeRef {
    pub id: NarrativeId,
    pub theme: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub entity: String,
    pub entity_type: EntityType,
    pub signal_score: f32,
    pub velocity: f64,
    pub source_count: usize,
    pub sentiment: f32,
    pub is_emerging: bool,
    pub narratives: Vec<SignalNarrativeRef>,
    pub last_updated: DateTime<Utc>,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BriefingType {
    Morning,
    Afternoon,
    Evening,
}

impl BriefingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BriefingType::Morning => "morning",
            BriefingType::Afternoon => "afternoon",
            BriefingType::Evening => "evening",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub narrative_id: Option<NarrativeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefingContent {
    pub narrative: String,
    pub key_insights: Vec<String>,
    pub entities_mentioned: Vec<String>,
    pub detected_patterns: Vec<String>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefingMetadata {
    pub model: String,
    pub confidence: f32,
    pub signal_count: usize,
    pub narrative_count: usize,
    pub pattern_count: usize,
    pub refinement_iterations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Briefing {
    pub id: String,
    #[serde(rename = "type")]
    pub briefing_type: BriefingType,
    pub generated_at: DateTime<Utc>,
    pub version: u32,
    pub content: BriefingContent,
    pub metadata: BriefingMetadata,
    pub is_smoke: bool,
    /// Missing in old rows pre-dating this field; readers must default to
    /// `true` (§9 "dynamic typing legacy").
    pub published: bool,
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRecord {
    pub model: String,
    pub operation: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cached: bool,
    pub timestamp: DateTime<Utc>,
    pub computed_cost: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_hash_is_deterministic() {
        let a = NarrativeFingerprint::compute_hash("Bitcoin", &["ETF".into(), "BlackRock".into()]);
        let b = NarrativeFingerprint::compute_hash("Bitcoin", &["BlackRock".into(), "ETF".into()]);
        assert_eq!(a, b, "hash must not depend on actor ordering");
    }

    #[test]
    fn fingerprint_hash_changes_with_nucleus() {
        let a = NarrativeFingerprint::compute_hash("Bitcoin", &["ETF".into()]);
        let b = NarrativeFingerprint::compute_hash("Ethereum", &["ETF".into()]);
        assert_ne!(a, b);
    }

    #[test]
    fn article_fingerprint_ignores_whitespace_differences() {
        let a = Article::compute_fingerprint("Bitcoin  surges", "body text here");
        let b = Article::compute_fingerprint("Bitcoin surges", "body   text here");
        assert_eq!(a, b);
    }

    #[test]
    fn article_fingerprint_case_insensitive() {
        let a = Article::compute_fingerprint("Bitcoin Surges", "Body");
        let b = Article::compute_fingerprint("bitcoin surges", "body");
        assert_eq!(a, b);
    }

    fn sample_narrative() -> Narrative {
        let now = Utc::now();
        Narrative {
            id: "n1".into(),
            title: "Bitcoin price surge".into(),
            summary: String::new(),
            nucleus_entity: "Bitcoin".into(),
            narrative_focus: "price surge".into(),
            top_actors: vec!["Bitcoin".into(), "ETF".into()],
            key_actions: vec![],
            entities: vec![],
            article_ids: vec!["a1".into(), "a2".into()],
            article_count: 2,
            first_seen: now,
            last_updated: now,
            last_article_at: now,
            lifecycle_state: LifecycleState::Rising,
            dormant_since: None,
            reactivated_count: 0,
            lifecycle_history: vec![],
            fingerprint: NarrativeFingerprint::new(
                "Bitcoin".into(),
                "price surge".into(),
                vec!["Bitcoin".into(), "ETF".into()],
                vec![],
                now,
            ),
            avg_sentiment: 0.0,
            velocity: 1.0,
            timeline_data: vec![],
            archived: false,
        }
    }

    #[test]
    fn article_count_matches_detects_duplicates() {
        let mut n = sample_narrative();
        n.article_ids.push("a1".into());
        assert!(!n.article_count_matches());
    }

    #[test]
    fn article_count_matches_holds_for_clean_state() {
        assert!(sample_narrative().article_count_matches());
    }

    #[test]
    fn dormant_invariant_holds_for_active_state() {
        assert!(sample_narrative().dormant_invariant_holds());
    }

    #[test]
    fn dormant_invariant_fails_when_dormant_without_timestamp() {
        let mut n = sample_narrative();
        n.lifecycle_state = LifecycleState::Dormant;
        assert!(!n.dormant_invariant_holds());
    }
}
