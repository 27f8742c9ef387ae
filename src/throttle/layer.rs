//! Tower middleware that enforces a [`FixedWindowLimiter`].
//!
//! The layer sits just outside the route handlers: a rejected request is
//! answered with `429 Too Many Requests` and a JSON body before the inner
//! service runs at all, and every allowed response is stamped with
//! `X-RateLimit-Limit` / `X-RateLimit-Remaining` / `X-RateLimit-Reset` so
//! clients can pace themselves.

use axum::{
    Json,
    extract::{ConnectInfo, Request},
    response::{IntoResponse, Response},
};
use http::{HeaderValue, StatusCode, header::RETRY_AFTER};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tower::{Layer, Service};

use super::FixedWindowLimiter;

/// Quota headers stamped on every throttled route's response.
pub const HEADER_LIMIT: &str = "x-ratelimit-limit";
/// See [`HEADER_LIMIT`].
pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
/// See [`HEADER_LIMIT`].
pub const HEADER_RESET: &str = "x-ratelimit-reset";

type KeyExtractor = Arc<dyn Fn(&Request) -> String + Send + Sync>;

/// Layer applying fixed-window rate limiting to the wrapped service.
///
/// By default requests are partitioned by client IP: the first entry of
/// `X-Forwarded-For` when present, otherwise the peer address from
/// `ConnectInfo`. Supply [`Self::with_key_extractor`] to partition by
/// something else (an API key, a tenant id).
///
/// # Examples
///
/// ```
/// use replyguard::{FixedWindowLimiter, ThrottleLayer};
/// use axum::{Router, routing::post};
/// use std::{sync::Arc, time::Duration};
///
/// let limiter = Arc::new(FixedWindowLimiter::new(5, Duration::from_secs(60)));
/// let app: Router = Router::new()
///     .route("/expensive", post(|| async { "done" }))
///     .layer(ThrottleLayer::new(limiter));
/// ```
#[derive(Clone)]
pub struct ThrottleLayer {
    limiter: Arc<FixedWindowLimiter>,
    key_extractor: KeyExtractor,
}

impl ThrottleLayer {
    /// Creates a layer enforcing the given limiter with the default
    /// client-IP key extractor.
    pub fn new(limiter: Arc<FixedWindowLimiter>) -> Self {
        Self {
            limiter,
            key_extractor: Arc::new(client_identifier),
        }
    }

    /// Replaces the identifier-extraction function.
    #[must_use]
    pub fn with_key_extractor<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&Request) -> String + Send + Sync + 'static,
    {
        self.key_extractor = Arc::new(extractor);
        self
    }
}

impl<S> Layer<S> for ThrottleLayer {
    type Service = ThrottleService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ThrottleService {
            inner,
            limiter: self.limiter.clone(),
            key_extractor: self.key_extractor.clone(),
        }
    }
}

/// Service produced by [`ThrottleLayer`].
#[derive(Clone)]
pub struct ThrottleService<S> {
    inner: S,
    limiter: Arc<FixedWindowLimiter>,
    key_extractor: KeyExtractor,
}

impl<S> Service<Request> for ThrottleService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let key = (self.key_extractor)(&req);
        let limiter = self.limiter.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !limiter.is_allowed(&key) {
                tracing::warn!(client = %key, "Rate limit exceeded");
                return Ok(rejection_response(&limiter, &key));
            }

            let mut response = inner.call(req).await?;
            stamp_quota_headers(response.headers_mut(), &limiter, &key);
            Ok(response)
        })
    }
}

/// Default identifier extractor: first `X-Forwarded-For` entry, then the
/// peer address, then a shared bucket for unidentifiable callers.
fn client_identifier(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Builds the 429 response for a rejected request.
fn rejection_response(limiter: &FixedWindowLimiter, key: &str) -> Response {
    let retry_after = limiter.retry_after(key);
    let retry_secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;

    let body = json!({
        "error": "Too many requests. Please try again later.",
        "retry_after": retry_secs,
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(RETRY_AFTER, header_number(retry_secs));
    headers.insert(HEADER_LIMIT, header_number(limiter.max_requests() as u64));
    headers.insert(HEADER_REMAINING, header_number(0));
    headers.insert(HEADER_RESET, header_number(reset_epoch_secs(limiter, key)));
    response
}

/// Stamps post-call quota headers on an allowed response.
fn stamp_quota_headers(
    headers: &mut http::HeaderMap,
    limiter: &FixedWindowLimiter,
    key: &str,
) {
    headers.insert(HEADER_LIMIT, header_number(limiter.max_requests() as u64));
    headers.insert(
        HEADER_REMAINING,
        header_number(limiter.remaining_requests(key) as u64),
    );
    headers.insert(HEADER_RESET, header_number(reset_epoch_secs(limiter, key)));
}

/// Unix timestamp (seconds) at which the identifier's window resets.
fn reset_epoch_secs(limiter: &FixedWindowLimiter, key: &str) -> u64 {
    let reset_at = SystemTime::now() + limiter.retry_after(key);
    reset_at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn header_number(n: u64) -> HeaderValue {
    HeaderValue::from_str(&n.to_string()).unwrap_or_else(|_| HeaderValue::from_static("0"))
}
