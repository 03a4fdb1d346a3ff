use chrono::Utc;
use narrative_common::error::NarrativeResult;
use narrative_store::narratives::NarrativeStore;
use tracing::info;

/// One-shot idempotent repair for narratives whose `narrative_focus` is
/// empty — rows written before the field was populated at creation time.
/// Derives a focus string from the narrative's own `key_actions`/
/// `top_actors` rather than touching the nucleus entity, so the repair
/// never invents a topic the narrative's articles didn't already establish.
pub struct NarrativeFocusBackfill {
    store: NarrativeStore,
}

impl NarrativeFocusBackfill {
    pub fn new(store: NarrativeStore) -> Self {
        Self { store }
    }

    pub async fn run(&self) -> NarrativeResult<usize> {
        let missing = self.store.list_missing_narrative_focus().await?;
        let mut fixed = 0;

        for mut narrative in missing {
            let expected = narrative.last_updated;
            let focus = derive_focus(&narrative.key_actions, &narrative.top_actors, &narrative.nucleus_entity);
            if focus.is_empty() {
                info!(narrative_id = %narrative.id, "no data to derive narrative_focus from, skipping");
                continue;
            }

            narrative.narrative_focus = focus;
            narrative.last_updated = Utc::now();

            if self.store.try_update(&narrative, expected).await? {
                fixed += 1;
            } else {
                info!(narrative_id = %narrative.id, "skipped narrative_focus backfill, concurrent write in progress");
            }
        }

        Ok(fixed)
    }
}

fn derive_focus(key_actions: &[String], top_actors: &[String], nucleus_entity: &str) -> String {
    if let Some(action) = key_actions.first() {
        return action.clone();
    }
    if let Some(actor) = top_actors.first() {
        return actor.clone();
    }
    if !nucleus_entity.is_empty() {
        return nucleus_entity.to_string();
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_focus_prefers_key_actions() {
        let focus = derive_focus(&["announced a hard fork".to_string()], &["Vitalik".to_string()], "Ethereum");
        assert_eq!(focus, "announced a hard fork");
    }

    #[test]
    fn derive_focus_falls_back_to_top_actors() {
        let focus = derive_focus(&[], &["Vitalik".to_string()], "Ethereum");
        assert_eq!(focus, "Vitalik");
    }

    #[test]
    fn derive_focus_falls_back_to_nucleus() {
        let focus = derive_focus(&[], &[], "Ethereum");
        assert_eq!(focus, "Ethereum");
    }

    #[test]
    fn derive_focus_empty_when_nothing_available() {
        assert_eq!(derive_focus(&[], &[], ""), "");
    }
}
