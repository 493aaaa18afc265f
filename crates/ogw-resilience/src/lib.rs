//! Resilience Wrapper (C2): token-bucket rate limiting, a circuit breaker,
//! and retry-with-backoff, each usable standalone so `ogw-backend` can
//! compose them around the GraphQL transport (spec.md §4.2).

pub mod circuit_breaker;
pub mod rate_limiter;
pub mod retry;
pub mod token_bucket;

pub use circuit_breaker::{Admission, CircuitBreaker, CircuitSnapshot, CircuitState};
pub use rate_limiter::{RateLimiterRegistry, RateLimiterSnapshot, DEFAULT_CLASS};
pub use retry::{retry_with_backoff, Retriable};
pub use token_bucket::{TokenBucket, TokenBucketSnapshot};
