//! Traffic control middleware: rate limiting, timeouts and panic catching.

use super::router::FluentRouter;
use crate::{Middleware, throttle};

use {
    http::{Response, StatusCode},
    std::sync::Arc,
    tokio_util::task::AbortOnDropHandle,
    tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer},
};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up router-wide fixed-window rate limiting.
    ///
    /// Builds a [`throttle::FixedWindowLimiter`] from `[rate_limit]`, spawns
    /// its periodic sweep task (aborted when the router is dropped) and
    /// layers a [`throttle::ThrottleLayer`] over every route added so far.
    /// Requests over the limit receive `429 Too Many Requests` with
    /// `Retry-After` and `X-RateLimit-*` headers; allowed requests carry the
    /// same quota headers.
    ///
    /// # Configuration
    ///
    /// ```toml
    /// [rate_limit]
    /// max_requests = 30
    /// window = "1m"
    /// ```
    ///
    /// Setting `max_requests = 0` disables the router-wide limiter, which is
    /// useful for tests driving the router with `oneshot()`.
    ///
    /// Bulk endpoints carry their own, stricter limiter layered at the route
    /// level (see `generation_routes`); this one bounds the whole surface.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime, since it spawns the sweep
    /// task.
    #[must_use]
    pub fn setup_rate_limiting(mut self) -> Self {
        if self.config.rate_limit.max_requests == 0
            || !self.is_middleware_enabled(Middleware::RateLimiting)
        {
            return self;
        }

        let limiter = Arc::new(throttle::FixedWindowLimiter::new(
            self.config.rate_limit.max_requests,
            self.config.rate_limit.window,
        ));

        // Periodic sweep bounds memory; rejection correctness never depends on it
        let handle = tokio::spawn(throttle::sweep_task(
            limiter.clone(),
            self.config.rate_limit.sweep_interval,
        ));
        self.limiter_sweeper = Some(AbortOnDropHandle::new(handle));

        self.inner = self.inner.layer(throttle::ThrottleLayer::new(limiter));
        self
    }

    /// Sets up request timeout middleware.
    ///
    /// Aborts requests that take longer than the configured duration with a
    /// `408 Request Timeout` response. Generation calls against a slow
    /// provider are the usual victims.
    ///
    /// # Configuration
    ///
    /// ```toml
    /// [http]
    /// request_timeout = "30s"  # Optional, uses humantime format
    /// ```
    #[must_use]
    pub fn setup_timeout(mut self) -> Self {
        if !self.is_middleware_enabled(Middleware::Timeout) {
            return self;
        }

        if let Some(timeout) = self.config.http.request_timeout {
            self.inner = self.inner.layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                timeout,
            ));
        }
        self
    }

    /// Sets up panic catching middleware.
    ///
    /// Catches panics in request handlers and returns a `500 Internal Server
    /// Error` response instead of crashing the server. The panic message goes
    /// to the log, never to the client.
    ///
    /// This middleware is installed by `setup_middleware()` as the outermost
    /// layer so that ALL panics from inner layers are caught.
    #[must_use]
    pub fn setup_catch_panic(mut self) -> Self {
        if !self.is_middleware_enabled(Middleware::CatchPanic) {
            return self;
        }

        self.inner = self.inner.layer(CatchPanicLayer::custom(
            move |err: Box<dyn std::any::Any + Send + 'static>| {
                let msg = if let Some(s) = err.downcast_ref::<String>() {
                    format!("Service panicked: {}", s)
                } else if let Some(s) = err.downcast_ref::<&str>() {
                    format!("Service panicked: {}", s)
                } else {
                    "Service panicked with a non-string payload".to_string()
                };

                tracing::error!("{}", msg);

                // Built inside the panic handler, so avoid anything that could
                // itself panic
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
                    .body("Internal Server Error".to_string())
                    .unwrap_or_else(|_| Response::new("Internal Server Error".to_string()))
            },
        ));
        self
    }
}
