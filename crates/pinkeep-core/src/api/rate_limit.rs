//! Pacing for outbound API calls.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Single-slot cooldown gate for outbound API calls.
///
/// A guarded call starts no sooner than `min_interval` after the previous
/// guarded call finished. Waiters take the slot in arrival order.
#[derive(Clone)]
pub struct RateLimiter {
    last_completed: Arc<Mutex<Option<Instant>>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_completed: Arc::new(Mutex::new(None)),
            min_interval,
        }
    }

    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for the cooldown, then run `call` while holding the slot.
    pub async fn run<F, Fut, T>(&self, call: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut guard = self.last_completed.lock().await;

        if let Some(previous) = *guard {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                tracing::debug!(
                    wait_ms = ready_at.saturating_duration_since(Instant::now()).as_millis(),
                    "Rate limiter delaying call"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        let output = call().await;
        *guard = Some(Instant::now());
        output
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(
            crate::config::DEFAULT_RATE_LIMIT_INTERVAL_MS,
        ))
    }
}
