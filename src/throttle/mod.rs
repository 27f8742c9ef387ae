//! Fixed-window rate limiting.
//!
//! [`FixedWindowLimiter`] holds the per-identifier counters and exposes the
//! check/introspect/cleanup operations; [`ThrottleLayer`] wraps a service so
//! that rejected requests short-circuit with a 429 before any handler work,
//! and allowed ones carry `X-RateLimit-*` quota headers.

mod layer;
mod limiter;

pub use layer::*;
pub use limiter::*;
