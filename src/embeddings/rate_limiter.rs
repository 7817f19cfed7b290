// Client-side request pacing for remote embedding and chat backends.
//
// Each remote backend owns one limiter, so backends are paced independently.
// Requests are spaced at least `1 / requests_per_second` apart; a caller that
// arrives early sleeps for the remainder. Clones share the same schedule.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<RateLimiterInner>>,
}

struct RateLimiterInner {
    /// Minimum time between requests (zero = unlimited)
    interval: Duration,
    /// When the last request was allowed through
    last_request: Option<Instant>,
}

impl RateLimiter {
    /// Allow at most `requests_per_second` requests per second.
    /// Non-positive or non-finite rates disable pacing.
    pub fn new(requests_per_second: f64) -> Self {
        let interval = if requests_per_second.is_finite() && requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::ZERO
        };
        Self {
            inner: Arc::new(Mutex::new(RateLimiterInner {
                interval,
                last_request: None,
            })),
        }
    }

    /// A limiter that never waits.
    pub fn unlimited() -> Self {
        Self::new(0.0)
    }

    /// Wait until the next request slot, then claim it.
    pub async fn acquire(&self) {
        let mut inner = self.inner.lock().await;

        if let Some(last) = inner.last_request {
            let elapsed = Instant::now().duration_since(last);
            if elapsed < inner.interval {
                let sleep_time = inner.interval - elapsed;
                // Holding the lock while sleeping keeps later callers queued
                // behind this one, so slots are handed out in arrival order.
                tokio::time::sleep(sleep_time).await;
            }
        }

        inner.last_request = Some(Instant::now());
    }
}
