//! Middleware trait and the built-in stages.
//!
//! Middleware composes as an onion: each stage receives the request and a
//! consume-once [`Next`](crate::dispatcher::Next) continuation.

mod auth;
mod core;
mod envelope;
mod metrics;
mod tracing;

pub use auth::AuthMiddleware;
pub use core::{from_fn, FnMiddleware, Middleware};
pub use envelope::EnvelopeMiddleware;
pub use metrics::MetricsMiddleware;
pub use tracing::TracingMiddleware;
