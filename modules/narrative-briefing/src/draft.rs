use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RawRecommendation {
    pub title: String,
    pub narrative_title_hint: Option<String>,
}

/// Shape the composition call returns (§4.C10): `narrative` here is the
/// briefing's prose summary, not a narrative-entity reference.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RawBriefingDraft {
    pub narrative: String,
    pub key_insights: Vec<String>,
    pub entities_mentioned: Vec<String>,
    pub detected_patterns: Vec<String>,
    pub recommendations: Vec<RawRecommendation>,
}

/// Self-refinement critique output (§4.C10): checks grounded facts,
/// fabricated prices, and promissory language.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RawCritique {
    pub confidence: f32,
    pub issues: Vec<String>,
}
