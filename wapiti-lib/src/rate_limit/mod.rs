//! Retry, concurrency and rate limiting configuration.

mod concurrency;
mod limiter;
mod retry;

pub use concurrency::ConcurrencyLimiter;
pub use limiter::RateLimiter;
pub use retry::RetryConfig;
