//! Tunables for a query operation.

use std::time::Duration;

use crate::rate_limit::ConcurrencyLimiter;
use crate::rate_limit::RateLimiter;
use crate::rate_limit::RetryConfig;

/// Default number of items per batch (the API's limit for most users).
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;

/// Default number of continuation pages followed per batch.
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// Configuration for running a [`QueryOperation`](super::QueryOperation).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use wapiti_lib::api::query::QueryOptions;
/// use wapiti_lib::rate_limit::RetryConfig;
///
/// let options = QueryOptions::default()
///     .max_batch_size(500)
///     .max_pages(50)
///     .concurrency_limit(2)
///     .retry(RetryConfig::default().max_retries(5))
///     .request_timeout(Duration::from_secs(30))
///     .timeout(Duration::from_secs(300));
///
/// assert_eq!(options.max_batch_size, 500);
/// ```
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Maximum items of the batched field per request.
    ///
    /// Default: 50
    pub max_batch_size: usize,

    /// Maximum pages fetched per batch before the continuation limit trips.
    ///
    /// Default: 1000
    pub max_pages: usize,

    /// Retry behavior for transport failures.
    pub retry: RetryConfig,

    /// Bounds how many batches run at once. Clones share permits.
    ///
    /// Default: 4 concurrent batches
    pub concurrency: ConcurrencyLimiter,

    /// Timeout for each transport call. A timed-out call is retried.
    pub request_timeout: Option<Duration>,

    /// Deadline for the whole operation.
    pub timeout: Option<Duration>,

    /// Awaited before every request, if set.
    pub rate_limiter: Option<RateLimiter>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            retry: RetryConfig::default(),
            concurrency: ConcurrencyLimiter::default(),
            request_timeout: None,
            timeout: None,
            rate_limiter: None,
        }
    }
}

impl QueryOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the batch size. Zero is treated as one.
    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size.max(1);
        self
    }

    /// Sets the page limit per batch.
    pub fn max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages;
        self
    }

    /// Sets the retry configuration.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Limits concurrent batches with a fresh limiter.
    pub fn concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency = ConcurrencyLimiter::new(limit);
        self
    }

    /// Uses a shared concurrency limiter.
    pub fn concurrency_limiter(mut self, limiter: ConcurrencyLimiter) -> Self {
        self.concurrency = limiter;
        self
    }

    /// Sets the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the whole-operation deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Paces requests with a shared rate limiter.
    pub fn rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }
}
