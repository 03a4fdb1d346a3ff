use chrono::Utc;
use narrative_common::types::CostRecord;
use narrative_store::cost::CostRecordStore;

/// `$` per 1K tokens, input/output, for each model the façade is allowed
/// to select. Unknown models fall back to the `DEFAULT` rate rather than
/// panicking, since a newly-added fallback model might not be in the
/// table yet.
pub struct ModelRate {
    pub model: &'static str,
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

pub const MODEL_RATES: &[ModelRate] = &[
    ModelRate { model: "claude-3-5-haiku-20241022", input_per_1k: 0.0008, output_per_1k: 0.004 },
    ModelRate { model: "claude-3-5-sonnet-20241022", input_per_1k: 0.003, output_per_1k: 0.015 },
    ModelRate { model: "gpt-4o-mini", input_per_1k: 0.00015, output_per_1k: 0.0006 },
    ModelRate { model: "gpt-4o", input_per_1k: 0.0025, output_per_1k: 0.01 },
];

const DEFAULT_RATE: ModelRate = ModelRate { model: "unknown", input_per_1k: 0.003, output_per_1k: 0.015 };

fn rate_for(model: &str) -> &'static ModelRate {
    MODEL_RATES.iter().find(|r| r.model == model).unwrap_or(&DEFAULT_RATE)
}

pub fn compute_cost(model: &str, input_tokens: u32, output_tokens: u32) -> f64 {
    let rate = rate_for(model);
    (input_tokens as f64 / 1000.0) * rate.input_per_1k
        + (output_tokens as f64 / 1000.0) * rate.output_per_1k
}

/// Daily spend above this surfaces an alert (§4.C3).
pub const DAILY_ALERT_THRESHOLD_USD: f64 = 0.50;
/// Projected monthly spend (daily * 30) above this surfaces an alert.
pub const MONTHLY_ALERT_THRESHOLD_USD: f64 = 10.0;

#[derive(Clone)]
pub struct CostTracker {
    store: CostRecordStore,
}

pub struct SpendAlert {
    pub daily_total: f64,
    pub projected_monthly: f64,
    pub daily_exceeded: bool,
    pub monthly_exceeded: bool,
}

impl CostTracker {
    pub fn new(store: CostRecordStore) -> Self {
        Self { store }
    }

    /// Appends a `CostRecord` for every successful call, cached or not —
    /// cache hits still increment `cached_calls` via `cached: true` so the
    /// ledger reflects how much spend was avoided, not just what was
    /// spent (§4.C3).
    pub async fn record(
        &self,
        model: &str,
        operation: &str,
        input_tokens: u32,
        output_tokens: u32,
        cached: bool,
    ) -> anyhow::Result<()> {
        let computed_cost = if cached {
            0.0
        } else {
            compute_cost(model, input_tokens, output_tokens)
        };

        let record = CostRecord {
            model: model.to_string(),
            operation: operation.to_string(),
            input_tokens,
            output_tokens,
            cached,
            timestamp: Utc::now(),
            computed_cost,
        };

        self.store.append(&record).await
    }

    pub async fn check_spend_alert(&self) -> anyhow::Result<SpendAlert> {
        let since = Utc::now() - chrono::Duration::hours(24);
        let daily_total = self.store.total_since(since).await?;
        let projected_monthly = daily_total * 30.0;

        Ok(SpendAlert {
            daily_total,
            projected_monthly,
            daily_exceeded: daily_total > DAILY_ALERT_THRESHOLD_USD,
            monthly_exceeded: projected_monthly > MONTHLY_ALERT_THRESHOLD_USD,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_cost_known_model() {
        let cost = compute_cost("claude-3-5-haiku-20241022", 1000, 1000);
        assert!((cost - (0.0008 + 0.004)).abs() < 1e-9);
    }

    #[test]
    fn compute_cost_unknown_model_uses_default_rate() {
        let cost = compute_cost("some-future-model", 1000, 0);
        assert!((cost - DEFAULT_RATE.input_per_1k).abs() < 1e-9);
    }

    #[test]
    fn compute_cost_zero_tokens_is_free() {
        assert_eq!(compute_cost("gpt-4o", 0, 0), 0.0);
    }
}
