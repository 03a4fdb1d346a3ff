use chrono::Utc;
use narrative_common::error::NarrativeResult;
use narrative_common::types::NarrativeFingerprint;
use narrative_store::narratives::NarrativeStore;
use tracing::info;

/// One-shot idempotent repair (§4.C8) for narratives whose `fingerprint.hash`
/// is missing — a gap left by rows written before the hash field existed.
/// Safe to run repeatedly: a narrative with a populated hash never shows up
/// in `list_missing_fingerprint_hash` again.
pub struct FingerprintBackfill {
    store: NarrativeStore,
}

impl FingerprintBackfill {
    pub fn new(store: NarrativeStore) -> Self {
        Self { store }
    }

    pub async fn run(&self) -> NarrativeResult<usize> {
        let missing = self.store.list_missing_fingerprint_hash().await?;
        let mut fixed = 0;

        for mut narrative in missing {
            let expected = narrative.last_updated;
            narrative.fingerprint = NarrativeFingerprint::new(
                narrative.nucleus_entity.clone(),
                narrative.narrative_focus.clone(),
                narrative.top_actors.clone(),
                narrative.key_actions.clone(),
                Utc::now(),
            );
            narrative.last_updated = Utc::now();

            if self.store.try_update(&narrative, expected).await? {
                fixed += 1;
            } else {
                info!(narrative_id = %narrative.id, "skipped fingerprint backfill, concurrent write in progress");
            }
        }

        Ok(fixed)
    }
}
