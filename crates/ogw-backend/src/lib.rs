//! Backend Transport (C1) + Resilience Wrapper (C2) wiring: a pooled
//! GraphQL HTTP client (or a scriptable mock) behind a circuit breaker,
//! token-bucket rate limiter, and retry-with-backoff.

pub mod client;
pub mod mock;
pub mod resilient;
pub mod transport;

pub use client::HttpBackendTransport;
pub use mock::MockBackend;
pub use resilient::ResilientBackend;
pub use transport::{BackendTransport, GraphQlError, GraphQlRequest, GraphQlResponse, TransportError};
