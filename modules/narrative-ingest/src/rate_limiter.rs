use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

const WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window limiter for the ≤20 articles/min global cap through the
/// extractor when the LLM is engaged (§5 concurrency limits). Tier-3
/// articles that skip enrichment never touch this limiter.
pub struct RateLimiter {
    max_per_window: usize,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_per_window: usize) -> Self {
        Self { max_per_window, timestamps: Mutex::new(VecDeque::new()) }
    }

    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut timestamps = self.timestamps.lock().await;
                let now = Instant::now();
                while timestamps.front().is_some_and(|t| now.duration_since(*t) > WINDOW) {
                    timestamps.pop_front();
                }

                if timestamps.len() < self.max_per_window {
                    timestamps.push_back(now);
                    None
                } else {
                    let oldest = *timestamps.front().expect("len >= max_per_window > 0 implies non-empty");
                    Some(WINDOW - now.duration_since(oldest))
                }
            };

            match wait {
                None => return,
                Some(duration) => tokio::time::sleep(duration).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_the_limit_without_waiting() {
        let limiter = RateLimiter::new(3);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn blocks_once_the_window_is_full() {
        let limiter = RateLimiter::new(1);
        limiter.acquire().await;

        let acquired = tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(acquired.is_err(), "second acquire should block until the window clears");
    }
}
