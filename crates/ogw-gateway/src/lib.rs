//! Library surface for the `ogw-gateway` binary: component wiring
//! ([`bootstrap`]), the stdio/HTTP transport loops ([`transport`]), and the
//! CLI ([`cli`]), split out of `main.rs` so integration tests can build a
//! [`bootstrap::Gateway`] against a scripted [`ogw_backend::MockBackend`]
//! the same way `main.rs` builds one against the real Backend.

pub mod bootstrap;
pub mod cli;
pub mod transport;
