//! Fluent router builder and middleware composition.
//!
//! [`FluentRouter`] wraps `axum::Router` and layers the security stack in the
//! right order from configuration: throttling innermost of the wrappers (so
//! rejected requests never reach a handler), CORS and the defensive headers
//! outermost (so every response, including 429 rejections, carries them).

mod builder;
mod control;
mod features;
mod observability;
mod router;

pub use router::*;
