//! Sliding window rate limiter.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Sliding window rate limiter, awaited before every request dispatch.
///
/// The framework imposes no rate policy of its own. Attach a limiter to
/// [`QueryOptions`](crate::api::query::QueryOptions) to cap the number of
/// requests within a time window. Clones share one quota, so a single
/// limiter can pace every operation talking to the same wiki.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use wapiti_lib::rate_limit::RateLimiter;
///
/// // 10 requests per second
/// let limiter = RateLimiter::new(10, Duration::from_secs(1));
/// assert_eq!(limiter.capacity(), 10);
/// ```
#[derive(Debug, Clone)]
pub struct RateLimiter {
    inner: Arc<RateLimiterInner>,
}

#[derive(Debug)]
struct RateLimiterInner {
    /// Dispatch times within the current window, oldest first.
    sent: Mutex<VecDeque<Instant>>,
    capacity: u32,
    window: Duration,
}

impl RateLimiter {
    /// Creates a new rate limiter allowing `capacity` requests per `window`.
    pub fn new(capacity: u32, window: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(RateLimiterInner {
                sent: Mutex::new(VecDeque::with_capacity(capacity as usize)),
                capacity,
                window,
            }),
        }
    }

    /// Waits until a request may be sent and records it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut sent = self.inner.sent.lock().await;
                let now = Instant::now();
                self.prune(&mut sent, now);

                if (sent.len() as u32) < self.inner.capacity {
                    sent.push_back(now);
                    return;
                }
                sent.front()
                    .map(|oldest| (*oldest + self.inner.window).saturating_duration_since(now))
            };

            // Sleep without holding the lock.
            if let Some(wait) = wait {
                tokio::time::sleep(wait).await;
            }
        }
    }

    /// Returns the number of requests that can be sent immediately.
    pub async fn available(&self) -> u32 {
        let mut sent = self.inner.sent.lock().await;
        self.prune(&mut sent, Instant::now());
        self.inner.capacity.saturating_sub(sent.len() as u32)
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> u32 {
        self.inner.capacity
    }

    /// Returns the configured window duration.
    pub fn window(&self) -> Duration {
        self.inner.window
    }

    fn prune(&self, sent: &mut VecDeque<Instant>, now: Instant) {
        while sent
            .front()
            .is_some_and(|ts| now.saturating_duration_since(*ts) >= self.inner.window)
        {
            sent.pop_front();
        }
    }
}
