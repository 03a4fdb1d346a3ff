use std::sync::Arc;

use ai_client::Claude;
use ai_client::openai::StructuredOutput;
use anyhow::{anyhow, Result};
use narrative_store::llm_cache::LlmCacheStore;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::cost::CostTracker;

/// Outbound concurrency cap (§5): at most this many provider calls in
/// flight at once per worker, regardless of how many callers are racing
/// `complete`/`extract`.
const MAX_CONCURRENT_CALLS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Small, fast, cheap — used for extraction (§4.C6).
    Fast,
    /// Higher-quality — used for briefing composition (§4.C10).
    Quality,
}

/// Model-agnostic invocation with caching, fallback, and cost accounting.
/// Wraps the carried-forward `ai-client` crate's `Claude` agent; fallback
/// models are configured Claude model ids rather than a second provider
/// (see DESIGN.md), since the fallback contract only requires an ordered
/// model list to retry against, not a distinct API.
#[derive(Clone)]
pub struct LlmFacade {
    api_key: String,
    fast_model: String,
    quality_model: String,
    fallback_models: Vec<String>,
    cache: LlmCacheStore,
    cost: CostTracker,
    concurrency: Arc<Semaphore>,
}

impl LlmFacade {
    pub fn new(
        api_key: String,
        fast_model: impl Into<String>,
        quality_model: impl Into<String>,
        fallback_models: Vec<String>,
        cache: LlmCacheStore,
        cost: CostTracker,
    ) -> Self {
        Self {
            api_key,
            fast_model: fast_model.into(),
            quality_model: quality_model.into(),
            fallback_models,
            cache,
            cost,
            concurrency: Arc::new(Semaphore::new(MAX_CONCURRENT_CALLS)),
        }
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Quality => &self.quality_model,
        }
    }

    fn candidate_models(&self, tier: ModelTier) -> Vec<String> {
        let mut models = vec![self.model_for(tier).to_string()];
        models.extend(self.fallback_models.iter().cloned());
        models
    }

    fn cache_key(model: &str, prompt: &str, temperature: &str, max_tokens: u32) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update(b"|");
        hasher.update(prompt.as_bytes());
        hasher.update(b"|");
        hasher.update(temperature.as_bytes());
        hasher.update(b"|");
        hasher.update(max_tokens.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    fn estimate_tokens(s: &str) -> u32 {
        // Rough estimate; the provider's real usage isn't surfaced by the
        // convenience methods this façade calls. Good enough for cost
        // ledger trending, not for billing reconciliation.
        ((s.chars().count() as f64) / 4.0).ceil() as u32
    }

    /// Plain chat completion with caching, fallback and cost tracking.
    pub async fn complete(&self, operation: &str, tier: ModelTier, system: &str, user: &str) -> Result<String> {
        let prompt = format!("{system}\n---\n{user}");
        let primary_model = self.model_for(tier).to_string();
        let key = Self::cache_key(&primary_model, &prompt, "0.0", 4096);

        if let Ok(Some(cached)) = self.cache.get(&key).await {
            debug!(operation, model = %primary_model, "LLM cache hit");
            let _ = self.cost.record(&primary_model, operation, 0, 0, true).await;
            return Ok(cached);
        }

        let _permit = self.concurrency.acquire().await.expect("semaphore never closed");
        let mut last_err = None;
        for model in self.candidate_models(tier) {
            let client = Claude::new(&self.api_key, &model);
            match client.chat_completion(system, user).await {
                Ok(response) => {
                    let _ = self.cache.put(&key, &model, &response).await;
                    let input_tokens = Self::estimate_tokens(&prompt);
                    let output_tokens = Self::estimate_tokens(&response);
                    let _ = self.cost.record(&model, operation, input_tokens, output_tokens, false).await;
                    return Ok(response);
                }
                Err(e) => {
                    warn!(operation, model = %model, error = %e, "LLM call failed, trying next model");
                    last_err = Some(e);
                }
            }
        }

        Err(anyhow!(
            "all configured models failed for operation '{}': {}",
            operation,
            last_err.map(|e| e.to_string()).unwrap_or_default()
        ))
    }

    /// Structured extraction with the same cache/fallback/cost contract.
    pub async fn extract<T: StructuredOutput + DeserializeOwned + JsonSchema>(
        &self,
        operation: &str,
        tier: ModelTier,
        system: &str,
        user: &str,
    ) -> Result<T> {
        let prompt = format!("{system}\n---\n{user}");
        let primary_model = self.model_for(tier).to_string();
        let key = Self::cache_key(&primary_model, &prompt, "extract", 4096);

        if let Ok(Some(cached)) = self.cache.get(&key).await {
            let _ = self.cost.record(&primary_model, operation, 0, 0, true).await;
            if let Ok(value) = serde_json::from_str(&cached) {
                return Ok(value);
            }
        }

        let _permit = self.concurrency.acquire().await.expect("semaphore never closed");
        let mut last_err = None;
        for model in self.candidate_models(tier) {
            let client = Claude::new(&self.api_key, &model);
            match client.extract::<T>(system, user).await {
                Ok(value) => {
                    if let Ok(raw) = serde_json::to_string(&value) {
                        let _ = self.cache.put(&key, &model, &raw).await;
                    }
                    let input_tokens = Self::estimate_tokens(&prompt);
                    let output_tokens = Self::estimate_tokens("structured-response");
                    let _ = self.cost.record(&model, operation, input_tokens, output_tokens, false).await;
                    return Ok(value);
                }
                Err(e) => {
                    warn!(operation, model = %model, error = %e, "LLM extraction failed, trying next model");
                    last_err = Some(e);
                }
            }
        }

        Err(anyhow!(
            "all configured models failed for extraction '{}': {}",
            operation,
            last_err.map(|e| e.to_string()).unwrap_or_default()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_deterministic() {
        let a = LlmFacade::cache_key("m", "p", "0.0", 100);
        let b = LlmFacade::cache_key("m", "p", "0.0", 100);
        assert_eq!(a, b);
    }

    #[test]
    fn cache_key_differs_on_model() {
        let a = LlmFacade::cache_key("model-a", "p", "0.0", 100);
        let b = LlmFacade::cache_key("model-b", "p", "0.0", 100);
        assert_ne!(a, b);
    }

    #[test]
    fn estimate_tokens_grows_with_length() {
        assert!(LlmFacade::estimate_tokens("a longer string here") > LlmFacade::estimate_tokens("short"));
    }
}
