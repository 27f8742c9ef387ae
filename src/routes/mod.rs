//! HTTP route handlers.
//!
//! The generation endpoints wire the security core together: bodies are
//! sanitized, fields validated, the response cache consulted, and only then
//! is the external generation collaborator invoked.

mod generate;

pub use generate::*;
