use narrative_scheduler::TaskScheduler;
use narrative_signals::SignalDetector;
use narrative_store::Store;

/// Shared handle every handler reads through (§5: no in-memory
/// authoritative state, this is just wiring over the store + detector).
pub struct AppState {
    pub store: Store,
    pub signals: SignalDetector,
    pub scheduler: TaskScheduler,
    pub api_key: String,
}
