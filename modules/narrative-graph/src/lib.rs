pub mod consolidation;
pub mod engine;
pub mod fingerprint_backfill;
pub mod lifecycle;
pub mod matcher;
pub mod narrative_focus_backfill;
pub mod similarity;

pub use consolidation::{ConsolidationStats, Consolidator, MergeDecision};
pub use engine::NarrativeEngine;
pub use fingerprint_backfill::FingerprintBackfill;
pub use matcher::{Decision, NarrativeMatcher};
pub use narrative_focus_backfill::NarrativeFocusBackfill;
