//! # replyguard
//!
//! The request-security core of an AI review-response service: everything
//! between an untrusted HTTP request and the expensive generation call.
//!
//! Rate limiting, input sanitization, field validation, response caching and
//! envelope encryption are composed over Axum so that every endpoint
//! rate-limits before doing any work and every response carries the
//! defensive header set.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use replyguard::{Config, FluentRouter, GeneratorState, Result, generation_routes};
//! use replyguard::{GenerationParams, ResponseGenerator};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl ResponseGenerator for MyProvider {
//!     async fn generate(&self, params: &GenerationParams) -> std::result::Result<Vec<String>, String> {
//!         // call your AI provider SDK here
//!         Ok(vec![format!("Thank you for your {}-star review!", params.rating)])
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::default();  // Loads from config/{RUST_ENV}.toml
//!     config.setup_tracing();
//!
//!     let state = GeneratorState::new(&config, Arc::new(MyProvider));
//!
//!     FluentRouter::without_state(config)?
//!         .merge(generation_routes(state))
//!         .setup_middleware()?
//!         .start()
//!         .await
//! }
//! ```
//!
//! With `config/dev.toml`:
//! ```toml
//! [rate_limit]
//! max_requests = 30
//! window = "1m"
//!
//! [cache]
//! max_entries = 50
//! ttl = "10m"
//!
//! [security]
//! encryption_secret = "{{ ENCRYPTION_SECRET }}"
//! ```
//!
//! Run with `RUST_ENV=dev cargo run`.
//!
//! # What You Get
//!
//! | Feature | Description | Default |
//! |---------|-------------|---------|
//! | Rate limiting | Fixed-window per-IP throttling with quota headers | 30 req/min |
//! | Bulk throttling | Separate, stricter limit on bulk endpoints | 5 req/min |
//! | Input sanitization | Recursive cleansing of JSON bodies | Always |
//! | Field validation | Whitelist/range checks, 400 on failure | Always |
//! | Response cache | Bounded TTL cache in front of generation | 50 entries / 10 min |
//! | Envelope encryption | PBKDF2 + AES-256-GCM for sensitive data | Configured via env |
//! | Security headers | nosniff, frame-deny, referrer & permissions policy | Enabled |
//! | CORS | Origin allow-list reflection | Restrictive in prod |
//! | Panic recovery | Catches panics, returns 500, keeps running | Enabled |
//! | Graceful shutdown | Handles SIGTERM, drains connections | 30s timeout |
//!
//! # Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Configuration loading and validation ([`Config`]) |
//! | [`fluent`] | Router builder and middleware setup ([`FluentRouter`]) |
//! | [`throttle`] | Fixed-window limiter and its tower layer |
//! | [`cache`] | Bounded TTL response cache and key derivation |
//! | [`crypto`] | Envelope encryption and the secret vault |
//! | [`sanitize`] | Recursive JSON input cleansing |
//! | [`validate`] | Whitelist/range predicates for request fields |
//! | [`routes`] | Generation endpoints wiring the pipeline together |
//! | [`error`] | Error types and handling ([`Error`]) |
//!
//! # Error Handling
//!
//! The library uses a custom [`Result`] type. Errors convert to structured
//! JSON responses:
//!
//! ```json
//! {
//!   "error_code": "INVALID_INPUT",
//!   "message": "rating must be between 1 and 5"
//! }
//! ```
//!
//! Rate-limit rejections are not errors; the throttle layer answers them
//! directly with a 429 and `Retry-After`/`X-RateLimit-*` headers.

pub mod cache;
pub mod config;
pub mod crypto;
pub mod error;
pub mod fluent;
pub mod routes;
pub mod sanitize;
pub mod throttle;
pub mod utils;
pub mod validate;

pub use cache::{CacheStats, ResponseCache, response_cache_key};
pub use config::*;
pub use crypto::{CipherError, SecretVault, decrypt, encrypt};
pub use error::*;
pub use fluent::*;
pub use routes::{
    GenerationParams, GeneratorState, ResponseGenerator, generation_routes,
};
pub use sanitize::{
    sanitize_email, sanitize_review_text, sanitize_string, sanitize_value,
};
pub use throttle::{FixedWindowLimiter, ThrottleLayer};
pub use utils::{RequestIdGenerator, Sensitive, replace_handlebars_with_env};

pub type Result<T> = std::result::Result<T, Error>;
