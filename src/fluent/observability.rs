//! Observability middleware: request logging and correlation ids.

use super::router::FluentRouter;
use crate::{Middleware, RequestIdGenerator};

use {
    axum::body::Body,
    http::Request,
    tower_http::{
        request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
        trace::TraceLayer,
    },
};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up HTTP request/response logging middleware.
    ///
    /// Adds structured tracing for all HTTP requests with the method, path
    /// and request id recorded on the span. Output format follows the
    /// `logging.format` configuration.
    #[must_use]
    pub fn setup_logging(mut self) -> Self {
        if !self.is_middleware_enabled(Middleware::Logging) {
            return self;
        }

        self.inner = self.inner.layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");

                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        );
        self
    }

    /// Sets up request id generation and propagation.
    ///
    /// Incoming `x-request-id` headers are preserved; requests without one
    /// get a fresh UUIDv7. The id is echoed on the response so clients can
    /// quote it when reporting problems.
    ///
    /// Installed early (outermost side) by `setup_middleware()` so that even
    /// rate-limited requests are correlatable.
    #[must_use]
    pub fn setup_request_id(mut self) -> Self {
        if !self.is_middleware_enabled(Middleware::RequestId) {
            return self;
        }

        self.inner = self
            .inner
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(RequestIdGenerator));
        self
    }
}
