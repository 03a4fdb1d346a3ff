pub mod consolidate;
pub mod cost_report;
pub mod fingerprint_backfill;
pub mod narrative_focus_backfill;
