use std::future::Future;
use std::pin::Pin;

use tracing::{error, warn};

use crate::catalog::TaskSpec;

pub type TaskFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// Runs `task` under a fixed retry/backoff/time-limit contract (§4.C11).
/// The overall time limit bounds the whole retry sequence, not a single
/// attempt — this is what stops an infinite-retry loop (the "CoinDesk API"
/// failure mode §9) from ever running past its budget.
pub async fn run_with_retry<F>(spec: &TaskSpec, mut make_attempt: F) -> anyhow::Result<()>
where
    F: FnMut() -> TaskFuture,
{
    let attempt_sequence = async {
        let mut last_err = None;
        for attempt in 0..spec.max_attempts {
            match make_attempt().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(task = spec.name, attempt = attempt + 1, error = %e, "task attempt failed");
                    last_err = Some(e);
                    if attempt + 1 < spec.max_attempts {
                        let backoff = spec.backoff_base * 2u32.pow(attempt);
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("task '{}' failed with no recorded error", spec.name)))
    };

    match tokio::time::timeout(spec.time_limit, attempt_sequence).await {
        Ok(result) => {
            if let Err(ref e) = result {
                error!(task = spec.name, error = %e, "task exhausted retries");
            }
            result
        }
        Err(_) => {
            error!(task = spec.name, "task exceeded its overall time limit");
            Err(anyhow::anyhow!("task '{}' exceeded its time limit of {:?}", spec.name, spec.time_limit))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Schedule;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn spec(max_attempts: u32, time_limit: Duration) -> TaskSpec {
        TaskSpec {
            name: "test_task",
            schedule: Schedule::Interval(Duration::from_secs(1)),
            max_attempts,
            backoff_base: Duration::from_millis(1),
            time_limit,
        }
    }

    #[tokio::test]
    async fn succeeds_on_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = run_with_retry(&spec(3, Duration::from_secs(1)), move || {
            let c = c.clone();
            Box::pin(async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_up_to_max_attempts_then_fails() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = run_with_retry(&spec(3, Duration::from_secs(5)), move || {
            let c = c.clone();
            Box::pin(async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(anyhow::anyhow!("boom"))
            })
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = run_with_retry(&spec(3, Duration::from_secs(5)), move || {
            let c = c.clone();
            Box::pin(async move {
                let n = c.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(anyhow::anyhow!("first attempt fails"))
                } else {
                    Ok(())
                }
            })
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn overall_time_limit_aborts_even_with_retries_left() {
        let result = run_with_retry(&spec(5, Duration::from_millis(20)), || {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
        })
        .await;
        assert!(result.is_err());
    }
}
