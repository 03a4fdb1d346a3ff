use narrative_common::types::{ArticleFingerprint, EntityType, ExtractedEntity, Sentiment};
use narrative_common::util::{canonicalize_project, normalize_ticker};
use narrative_llm::{LlmFacade, ModelTier};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

const MAX_BATCH_SIZE: usize = 10;
const MAX_BODY_CHARS: usize = 2000;

#[derive(Debug, Deserialize, JsonSchema)]
struct RawEntity {
    name: String,
    #[serde(rename = "type")]
    entity_type: String,
    confidence: f32,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RawArticleExtraction {
    article_index: usize,
    entities: Vec<RawEntity>,
    narrative_focus: String,
    top_actors: Vec<String>,
    key_actions: Vec<String>,
    sentiment: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RawBatchExtraction {
    results: Vec<RawArticleExtraction>,
}

/// Output of C6 for one article: normalized entities/focus/actors/actions/
/// sentiment, plus the fingerprint the matcher consumes directly.
#[derive(Debug, Clone)]
pub struct ArticleExtraction {
    pub entities: Vec<ExtractedEntity>,
    pub sentiment: Sentiment,
    pub fingerprint: ArticleFingerprint,
}

pub struct Extractor {
    llm: LlmFacade,
}

impl Extractor {
    pub fn new(llm: LlmFacade) -> Self {
        Self { llm }
    }

    /// Batch-extract up to `MAX_BATCH_SIZE` articles in one LLM call
    /// (§4.C6). `articles` is `(title, body)` pairs; the return vector is
    /// the same length and order, with `None` for any article whose
    /// individual retry also failed.
    pub async fn extract_batch(&self, articles: &[(String, String)]) -> Vec<Option<ArticleExtraction>> {
        if articles.is_empty() {
            return Vec::new();
        }

        let mut results = Vec::with_capacity(articles.len());
        for chunk in articles.chunks(MAX_BATCH_SIZE) {
            let chunk_results = self.extract_chunk(chunk).await;
            results.extend(chunk_results);
        }
        results
    }

    async fn extract_chunk(&self, chunk: &[(String, String)]) -> Vec<Option<ArticleExtraction>> {
        match self.call_batch(chunk).await {
            Ok(extractions) => extractions,
            Err(e) => {
                warn!(error = %e, batch_size = chunk.len(), "batch extraction failed, retrying individually");
                let mut out = Vec::with_capacity(chunk.len());
                for (title, body) in chunk {
                    let single_item = vec![(title.clone(), body.clone())];
                    match self.call_batch(&single_item).await {
                        Ok(mut single) => out.push(single.pop().flatten()),
                        Err(e) => {
                            warn!(error = %e, title = %title, "individual extraction failed, marking as failure");
                            out.push(None);
                        }
                    }
                }
                out
            }
        }
    }

    async fn call_batch(&self, chunk: &[(String, String)]) -> anyhow::Result<Vec<Option<ArticleExtraction>>> {
        let system = "You are a crypto-news entity extractor. For each article, return its index, \
            entities with a type and confidence, a 2-5 word narrative_focus phrase, up to 5 \
            top_actors ordered by salience, up to 3 key_actions, and overall sentiment \
            (pos/neg/neu).";

        let mut user = String::new();
        for (i, (title, body)) in chunk.iter().enumerate() {
            let truncated: String = body.chars().take(MAX_BODY_CHARS).collect();
            user.push_str(&format!("[{i}] TITLE: {title}\nBODY: {truncated}\n\n"));
        }

        let raw: RawBatchExtraction = self
            .llm
            .extract("extract_entities", ModelTier::Fast, system, &user)
            .await?;

        let mut slots: Vec<Option<ArticleExtraction>> = vec![None; chunk.len()];
        for item in raw.results {
            if item.article_index >= chunk.len() {
                continue;
            }
            slots[item.article_index] = Some(normalize_extraction(item));
        }

        Ok(slots)
    }
}

fn normalize_extraction(raw: RawArticleExtraction) -> ArticleExtraction {
    let mut entities = raw
        .entities
        .into_iter()
        .map(|e| {
            let entity_type = parse_entity_type(&e.entity_type);
            let name = normalize_entity_name(&e.name, entity_type);
            ExtractedEntity {
                name,
                entity_type,
                confidence: e.confidence.clamp(0.0, 1.0),
            }
        })
        .collect::<Vec<_>>();

    dedup_keep_highest_confidence(&mut entities);

    let sentiment = parse_sentiment(&raw.sentiment);

    let top_actors: Vec<String> = raw.top_actors.into_iter().take(5).collect();
    let key_actions: Vec<String> = raw.key_actions.into_iter().take(3).collect();

    let nucleus_entity = entities
        .iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        .map(|e| e.name.clone())
        .or_else(|| top_actors.first().cloned());

    let narrative_focus = if raw.narrative_focus.trim().is_empty() {
        None
    } else {
        Some(raw.narrative_focus.trim().to_string())
    };

    let fingerprint = ArticleFingerprint {
        nucleus_entity,
        narrative_focus,
        top_actors,
        key_actions,
    };

    ArticleExtraction { entities, sentiment, fingerprint }
}

/// Within an article, duplicate entity names collapse keeping the highest
/// confidence (§4.C6 "Deduplication").
fn dedup_keep_highest_confidence(entities: &mut Vec<ExtractedEntity>) {
    entities.sort_by(|a, b| a.name.cmp(&b.name).then(b.confidence.total_cmp(&a.confidence)));
    entities.dedup_by(|a, b| a.name == b.name);
}

fn normalize_entity_name(raw: &str, entity_type: EntityType) -> String {
    match entity_type {
        EntityType::Ticker => normalize_ticker(raw),
        EntityType::Project => canonicalize_project(raw),
        EntityType::Event => raw.to_lowercase(),
        _ => raw.to_string(),
    }
}

fn parse_entity_type(raw: &str) -> EntityType {
    match raw.to_lowercase().as_str() {
        "ticker" => EntityType::Ticker,
        "project" => EntityType::Project,
        "person" => EntityType::Person,
        "organization" | "org" => EntityType::Organization,
        "event" => EntityType::Event,
        _ => EntityType::Concept,
    }
}

fn parse_sentiment(raw: &str) -> Sentiment {
    match raw.to_lowercase().as_str() {
        "pos" | "positive" => Sentiment::Pos,
        "neg" | "negative" => Sentiment::Neg,
        _ => Sentiment::Neu,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_entity(name: &str, entity_type: &str, confidence: f32) -> RawEntity {
        RawEntity { name: name.to_string(), entity_type: entity_type.to_string(), confidence }
    }

    #[test]
    fn dedup_keeps_highest_confidence() {
        let mut entities = vec![
            ExtractedEntity { name: "$BTC".into(), entity_type: EntityType::Ticker, confidence: 0.4 },
            ExtractedEntity { name: "$BTC".into(), entity_type: EntityType::Ticker, confidence: 0.9 },
        ];
        dedup_keep_highest_confidence(&mut entities);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].confidence, 0.9);
    }

    #[test]
    fn normalize_ticker_entity_name() {
        assert_eq!(normalize_entity_name("btc", EntityType::Ticker), "$BTC");
    }

    #[test]
    fn normalize_project_entity_name() {
        assert_eq!(normalize_entity_name("bitcoin", EntityType::Project), "Bitcoin");
    }

    #[test]
    fn normalize_event_entity_name_lowercased() {
        assert_eq!(normalize_entity_name("ETF Approval", EntityType::Event), "etf approval");
    }

    #[test]
    fn normalize_extraction_derives_nucleus_from_highest_confidence_entity() {
        let raw = RawArticleExtraction {
            article_index: 0,
            entities: vec![raw_entity("btc", "ticker", 0.5), raw_entity("bitcoin", "project", 0.95)],
            narrative_focus: "price surge".into(),
            top_actors: vec!["Bitcoin".into()],
            key_actions: vec![],
            sentiment: "pos".into(),
        };
        let extraction = normalize_extraction(raw);
        assert_eq!(extraction.fingerprint.nucleus_entity.as_deref(), Some("Bitcoin"));
    }

    #[test]
    fn normalize_extraction_empty_focus_becomes_none() {
        let raw = RawArticleExtraction {
            article_index: 0,
            entities: vec![],
            narrative_focus: "   ".into(),
            top_actors: vec![],
            key_actions: vec![],
            sentiment: "neu".into(),
        };
        let extraction = normalize_extraction(raw);
        assert!(extraction.fingerprint.narrative_focus.is_none());
    }

    #[test]
    fn normalize_extraction_caps_actors_and_actions() {
        let raw = RawArticleExtraction {
            article_index: 0,
            entities: vec![],
            narrative_focus: "x".into(),
            top_actors: (0..8).map(|i| format!("actor{i}")).collect(),
            key_actions: (0..5).map(|i| format!("action{i}")).collect(),
            sentiment: "neu".into(),
        };
        let extraction = normalize_extraction(raw);
        assert_eq!(extraction.fingerprint.top_actors.len(), 5);
        assert_eq!(extraction.fingerprint.key_actions.len(), 3);
    }
}
