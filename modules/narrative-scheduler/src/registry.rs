use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::{self, TASK_CATALOG};
use crate::retry::TaskFuture;

/// Parameters a manual trigger can pass to a task (§4.C11, `/admin/trigger-briefing?force&is_smoke`).
/// Scheduled (cron/interval) runs always use `TaskParams::default()`; only
/// the briefing tasks currently read these, other handlers ignore them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskParams {
    pub force: bool,
    pub is_smoke: bool,
}

pub type TaskHandler = Arc<dyn Fn(TaskParams) -> TaskFuture + Send + Sync>;

/// Maps catalog task names to their runtime handlers. `validate` is called
/// once at worker start — a catalog entry without a registered handler, or
/// vice versa, fails loudly rather than silently dropping a scheduled task
/// (§4.C11 "task name mismatch... must fail loudly at worker start").
#[derive(Default, Clone)]
pub struct TaskRegistry {
    handlers: HashMap<&'static str, TaskHandler>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, handler: TaskHandler) {
        self.handlers.insert(name, handler);
    }

    pub fn get(&self, name: &str) -> Option<TaskHandler> {
        self.handlers.get(name).cloned()
    }

    pub fn validate(&self) -> Result<(), String> {
        let missing: Vec<&str> = TASK_CATALOG
            .iter()
            .map(|t| t.name)
            .filter(|name| !self.handlers.contains_key(name))
            .collect();

        if !missing.is_empty() {
            return Err(format!("no handler registered for catalog tasks: {}", missing.join(", ")));
        }

        let unknown: Vec<&'static str> = self.handlers.keys().copied().filter(|name| catalog::find(name).is_none()).collect();
        if !unknown.is_empty() {
            return Err(format!("handlers registered for tasks absent from the catalog: {:?}", unknown));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TASK_CATALOG;

    fn noop_handler() -> TaskHandler {
        Arc::new(|_params| Box::pin(async { Ok(()) }))
    }

    #[test]
    fn validate_fails_when_a_catalog_task_has_no_handler() {
        let registry = TaskRegistry::new();
        assert!(registry.validate().is_err());
    }

    #[test]
    fn validate_succeeds_when_every_catalog_task_is_registered() {
        let mut registry = TaskRegistry::new();
        for task in TASK_CATALOG {
            registry.register(task.name, noop_handler());
        }
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn validate_fails_on_unknown_handler_name() {
        let mut registry = TaskRegistry::new();
        for task in TASK_CATALOG {
            registry.register(task.name, noop_handler());
        }
        registry.register("not_in_catalog", noop_handler());
        assert!(registry.validate().is_err());
    }
}
