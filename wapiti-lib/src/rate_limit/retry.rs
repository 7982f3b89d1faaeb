//! Retry configuration for transport failures.

use std::time::Duration;

use rand::Rng;

use crate::error::TransportError;

/// Configuration for automatic retry of failed requests.
///
/// Only transport failures are retried: rate limiting (429), server errors
/// (5xx), network errors and request timeouts. Malformed responses and
/// server-reported API errors are never retried.
///
/// The delay starts at `initial_delay`, doubles every attempt up to
/// `max_delay`, and gets up to `jitter` of random extra wait. A 429 with a
/// `Retry-After` header waits for the server's value instead.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use wapiti_lib::rate_limit::RetryConfig;
///
/// let config = RetryConfig::default()
///     .max_retries(5)
///     .initial_delay(Duration::from_millis(500))
///     .max_delay(Duration::from_secs(60))
///     .jitter(Duration::from_millis(100));
///
/// let no_retry = RetryConfig::no_retry();
/// assert_eq!(no_retry.max_retries, 0);
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try.
    pub max_retries: u32,
    /// Initial delay between retries (doubles each attempt).
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Upper bound of random extra delay added to each wait.
    pub jitter: Duration,
    /// Whether to retry on HTTP 429 (rate limited).
    pub retry_on_429: bool,
    /// Whether to retry on HTTP 5xx (server errors).
    pub retry_on_5xx: bool,
    /// Whether to retry on network errors and timeouts.
    pub retry_on_network: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: Duration::ZERO,
            retry_on_429: true,
            retry_on_5xx: true,
            retry_on_network: true,
        }
    }
}

impl RetryConfig {
    /// Creates a config with all retries disabled.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            retry_on_429: false,
            retry_on_5xx: false,
            retry_on_network: false,
            ..Default::default()
        }
    }

    /// Sets the maximum number of retries.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Sets the initial delay between retries.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the maximum random jitter added to each delay.
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Enables or disables retry on HTTP 429.
    pub fn retry_on_429(mut self, enabled: bool) -> Self {
        self.retry_on_429 = enabled;
        self
    }

    /// Enables or disables retry on HTTP 5xx.
    pub fn retry_on_5xx(mut self, enabled: bool) -> Self {
        self.retry_on_5xx = enabled;
        self
    }

    /// Enables or disables retry on network errors.
    pub fn retry_on_network(mut self, enabled: bool) -> Self {
        self.retry_on_network = enabled;
        self
    }

    /// Decides whether a failed attempt should be retried.
    ///
    /// `retries` is the number of retries already made.
    pub fn should_retry(&self, error: &TransportError, retries: u32) -> bool {
        if retries >= self.max_retries || !error.is_retryable() {
            return false;
        }
        match error {
            TransportError::Http { .. } if error.is_rate_limited() => self.retry_on_429,
            TransportError::Http { .. } => self.retry_on_5xx,
            TransportError::Network(_) | TransportError::Timeout(_) => self.retry_on_network,
            _ => false,
        }
    }

    /// Returns how long to wait before retry number `retries + 1`.
    ///
    /// A server `Retry-After` takes priority but never exceeds `max_delay`.
    pub fn delay_for(&self, error: &TransportError, retries: u32) -> Duration {
        if let Some(retry_after) = error.retry_after() {
            return retry_after.min(self.max_delay);
        }

        let factor = 2u32.saturating_pow(retries);
        let base = self.initial_delay.saturating_mul(factor).min(self.max_delay);
        if self.jitter.is_zero() {
            return base;
        }
        let extra = rand::rng().random_range(Duration::ZERO..=self.jitter);
        base + extra
    }
}
