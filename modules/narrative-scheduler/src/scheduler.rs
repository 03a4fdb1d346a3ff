use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use uuid::Uuid;

use crate::catalog::{Schedule, TASK_CATALOG};
use crate::registry::{TaskParams, TaskRegistry};
use crate::retry::run_with_retry;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("scheduler setup failed: {0}")]
    Setup(String),
    #[error("task registry validation failed: {0}")]
    Registry(String),
}

/// Wires the task catalog to its handlers: cron-scheduled tasks run
/// through `tokio_cron_scheduler`, fixed-interval tasks run on their own
/// `tokio::time::interval` loop. Both paths funnel through
/// `run_with_retry` so every task gets the same retry/backoff/time-limit
/// treatment regardless of how it's triggered.
pub struct TaskScheduler {
    cron: JobScheduler,
    registry: Arc<TaskRegistry>,
}

impl TaskScheduler {
    pub async fn new(registry: TaskRegistry) -> Result<Self, SchedulerError> {
        registry.validate().map_err(SchedulerError::Registry)?;
        let cron = JobScheduler::new().await.map_err(|e| SchedulerError::Setup(e.to_string()))?;
        Ok(Self { cron, registry: Arc::new(registry) })
    }

    pub async fn start(&self) -> Result<(), SchedulerError> {
        for task in TASK_CATALOG {
            match task.schedule {
                Schedule::Cron(expr) => self.schedule_cron(task.name, expr).await?,
                Schedule::Interval(period) => self.schedule_interval(task.name, period),
            }
        }
        self.cron.start().await.map_err(|e| SchedulerError::Setup(e.to_string()))?;
        Ok(())
    }

    async fn schedule_cron(&self, name: &'static str, expr: &str) -> Result<(), SchedulerError> {
        let registry = self.registry.clone();
        let job = Job::new_async(expr, move |_uuid, _l| {
            let registry = registry.clone();
            Box::pin(async move {
                dispatch(&registry, name, TaskParams::default()).await;
            })
        })
        .map_err(|e| SchedulerError::Setup(e.to_string()))?;

        self.cron.add(job).await.map_err(|e| SchedulerError::Setup(e.to_string()))?;
        Ok(())
    }

    fn schedule_interval(&self, name: &'static str, period: std::time::Duration) {
        let registry = self.registry.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                dispatch(&registry, name, TaskParams::default()).await;
            }
        });
    }

    /// Backs `POST /admin/trigger-briefing` (§4.C11): returns a task id
    /// immediately while execution happens on a detached task. `params`
    /// carries the request's `force`/`is_smoke` flags through to whichever
    /// handler is registered for `name`.
    pub fn trigger(&self, name: &'static str, params: TaskParams) -> String {
        let task_id = Uuid::new_v4().to_string();
        let registry = self.registry.clone();
        let id_for_log = task_id.clone();
        tokio::spawn(async move {
            info!(task_id = %id_for_log, task = name, "manual trigger dispatched");
            dispatch(&registry, name, params).await;
        });
        task_id
    }
}

async fn dispatch(registry: &TaskRegistry, name: &str, params: TaskParams) {
    let Some(spec) = crate::catalog::find(name) else {
        error!(task = name, "dispatch requested for a task absent from the catalog");
        return;
    };
    let Some(handler) = registry.get(name) else {
        error!(task = name, "no handler registered for catalog task, skipping");
        return;
    };

    let result = run_with_retry(spec, move || handler(params)).await;
    match result {
        Ok(()) => info!(task = name, "task completed"),
        Err(e) => error!(task = name, error = %e, "task failed after exhausting retries, scheduler continues to next period"),
    }
}
