use chrono::Utc;
use narrative_common::error::{NarrativeError, NarrativeResult};
use narrative_common::types::{Briefing, BriefingContent, BriefingMetadata, BriefingType, Recommendation};
use narrative_llm::{LlmFacade, ModelTier};
use narrative_signals::{SignalDetector, SignalQuery};
use narrative_store::Store;
use tracing::info;
use uuid::Uuid;

use crate::draft::{RawBriefingDraft, RawCritique};
use crate::linkage::match_narrative;

const MAX_ACTIVE_NARRATIVES: i64 = 10;
const MAX_REFINEMENT_ITERATIONS: u32 = 2;
const CONFIDENCE_STOP: f32 = 0.9;

pub struct BriefingGenerator {
    store: Store,
    llm: LlmFacade,
    signals: SignalDetector,
}

impl BriefingGenerator {
    pub fn new(store: Store, llm: LlmFacade, signals: SignalDetector) -> Self {
        Self { store, llm, signals }
    }

    /// §4.C10. Returns `Ok(None)` when the at-most-once-per-period guard
    /// silently no-ops (duplicate for today, `force=false`).
    pub async fn generate(&self, briefing_type: BriefingType, local_date: chrono::NaiveDate, force: bool, is_smoke: bool) -> NarrativeResult<Option<Briefing>> {
        if !force && !is_smoke {
            if self.store.briefings.by_type_and_date(briefing_type.as_str(), local_date).await?.is_some() {
                info!(briefing_type = briefing_type.as_str(), %local_date, "briefing already exists for this period, no-op");
                return Ok(None);
            }
        }

        let narratives = self.store.narratives.list_active(MAX_ACTIVE_NARRATIVES).await?;
        let signals = self
            .signals
            .trending(&SignalQuery { limit: 15, min_score: 0.0, entity_type: None, timeframe_hours: 24 })
            .await
            .unwrap_or_default();

        let system = system_prompt(briefing_type);
        let user = compose_input_prompt(&narratives, &signals);

        let mut draft: RawBriefingDraft = self
            .llm
            .extract("generate_briefing", ModelTier::Quality, &system, &user)
            .await
            .map_err(|e| NarrativeError::Llm(e.to_string()))?;

        let mut iterations = 0;
        let mut confidence = 0.0_f32;

        for _ in 0..MAX_REFINEMENT_ITERATIONS {
            let critique_prompt = critique_prompt(&draft, &user);
            let critique: RawCritique = match self
                .llm
                .extract("critique_briefing", ModelTier::Quality, CRITIQUE_SYSTEM_PROMPT, &critique_prompt)
                .await
            {
                Ok(c) => c,
                Err(_) => break,
            };

            confidence = critique.confidence;
            iterations += 1;

            if confidence >= CONFIDENCE_STOP {
                break;
            }

            let revision_prompt = revision_prompt(&draft, &critique, &user);
            match self
                .llm
                .extract::<RawBriefingDraft>("revise_briefing", ModelTier::Quality, &system, &revision_prompt)
                .await
            {
                Ok(revised) => draft = revised,
                Err(_) => break,
            }
        }

        let recommendations: Vec<Recommendation> = draft
            .recommendations
            .iter()
            .map(|r| Recommendation {
                title: r.title.clone(),
                narrative_id: match_narrative(r.narrative_title_hint.as_deref(), &narratives).map(|n| n.id.clone()),
            })
            .collect();

        let now = Utc::now();
        let briefing = Briefing {
            id: Uuid::new_v4().to_string(),
            briefing_type,
            generated_at: now,
            version: 1,
            content: BriefingContent {
                narrative: draft.narrative,
                key_insights: draft.key_insights,
                entities_mentioned: draft.entities_mentioned,
                detected_patterns: draft.detected_patterns,
                recommendations,
            },
            metadata: BriefingMetadata {
                model: "quality-tier".to_string(),
                confidence,
                signal_count: signals.len(),
                narrative_count: narratives.len(),
                pattern_count: 0,
                refinement_iterations: iterations,
            },
            is_smoke,
            published: !is_smoke,
            task_id: None,
        };

        let inserted = self.store.briefings.try_insert(&briefing, local_date, force).await?;
        if !inserted {
            info!(briefing_type = briefing_type.as_str(), %local_date, "briefing insert lost the race to a concurrent writer, no-op");
            return Ok(None);
        }

        Ok(Some(briefing))
    }
}

const CRITIQUE_SYSTEM_PROMPT: &str = "You are a fact-checking editor. Verify the draft only states facts present in the provided inputs, contains no fabricated prices, and makes no promises about future price movement. Return a confidence score in [0,1] and a list of issues.";

fn system_prompt(briefing_type: BriefingType) -> String {
    format!(
        "You write the {} crypto news briefing. Ground every claim in the provided narratives and signals; never invent prices or predictions.",
        briefing_type.as_str()
    )
}

fn compose_input_prompt(narratives: &[narrative_common::types::Narrative], signals: &[narrative_common::types::Signal]) -> String {
    let narrative_lines: Vec<String> = narratives
        .iter()
        .map(|n| format!("- {} ({}): {} articles, state={}", n.title, n.nucleus_entity, n.article_count, n.lifecycle_state.as_str()))
        .collect();
    let signal_lines: Vec<String> = signals
        .iter()
        .map(|s| format!("- {}: score={:.2}, velocity={:.2}", s.entity, s.signal_score, s.velocity))
        .collect();

    format!(
        "Active narratives:\n{}\n\nTrending signals:\n{}",
        narrative_lines.join("\n"),
        signal_lines.join("\n")
    )
}

fn critique_prompt(draft: &RawBriefingDraft, grounded_inputs: &str) -> String {
    format!("Grounded inputs:\n{}\n\nDraft to critique:\n{}", grounded_inputs, draft.narrative)
}

fn revision_prompt(draft: &RawBriefingDraft, critique: &RawCritique, grounded_inputs: &str) -> String {
    format!(
        "Grounded inputs:\n{}\n\nPrevious draft:\n{}\n\nIssues to fix:\n{}",
        grounded_inputs,
        draft.narrative,
        critique.issues.join("\n")
    )
}
