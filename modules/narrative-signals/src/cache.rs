use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use narrative_common::types::Signal;

const IN_PROCESS_TTL: Duration = Duration::from_secs(60);
pub const SHARED_CACHE_TTL_SECONDS: i64 = 120;

pub fn cache_key(limit: usize, min_score: f32, entity_type: Option<&str>, timeframe_hours: i64) -> String {
    format!("{}|{:.3}|{}|{}", limit, min_score, entity_type.unwrap_or("*"), timeframe_hours)
}

/// In-process layer (60s) in front of the shared `signals_cache` table
/// (120s, §4.C9). Both layers are optional and fail open — a process
/// restart just means the next call recomputes.
pub struct InProcessCache {
    entries: Mutex<HashMap<String, (Vec<Signal>, Instant)>>,
}

impl InProcessCache {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    pub fn get(&self, key: &str) -> Option<Vec<Signal>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).and_then(|(signals, inserted_at)| {
            if inserted_at.elapsed() < IN_PROCESS_TTL {
                Some(signals.clone())
            } else {
                None
            }
        })
    }

    pub fn put(&self, key: String, signals: Vec<Signal>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, (signals, Instant::now()));
    }
}

impl Default for InProcessCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_includes_all_dimensions() {
        let a = cache_key(10, 0.5, Some("ticker"), 24);
        let b = cache_key(10, 0.5, Some("project"), 24);
        assert_ne!(a, b);
    }

    #[test]
    fn cache_key_wildcards_missing_entity_type() {
        let key = cache_key(10, 0.5, None, 24);
        assert!(key.contains('*'));
    }

    #[test]
    fn in_process_cache_returns_put_value() {
        let cache = InProcessCache::new();
        cache.put("k".into(), vec![]);
        assert!(cache.get("k").is_some());
    }

    #[test]
    fn in_process_cache_misses_unknown_key() {
        let cache = InProcessCache::new();
        assert!(cache.get("missing").is_none());
    }
}
