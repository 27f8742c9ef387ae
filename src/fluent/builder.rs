//! Orchestration and router delegation: setup_middleware(), start(), layer(), route(), etc.

use super::router::FluentRouter;
use crate::Result;

use {
    axum::{Router, body::Body, routing::Route},
    http::Request,
    std::{convert::Infallible, net::SocketAddr, time::Duration},
    tokio::signal,
    tokio_util::sync::CancellationToken,
    tower::{Layer, Service},
};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up all standard middleware layers in the correct order.
    ///
    /// This is the **recommended way** to configure middleware. Individual
    /// `setup_*` methods exist for custom ordering, but the ordering rules
    /// are subtle enough that you rarely want to do it by hand.
    ///
    /// # Middleware Order
    ///
    /// Middleware is processed outside-in for requests and inside-out for
    /// responses; the **last layer added is the outermost** and runs
    /// **first** on incoming requests. The stack, innermost to outermost:
    ///
    /// 1. **Logging** - spans for requests that made it past throttling
    /// 2. **Timeout** - bound handler time (optional)
    /// 3. **Rate limiting** - reject excess traffic before any handler work
    /// 4. **CORS** - preflight handling & allow-list reflection
    /// 5. **Security headers** - stamped on every response, 429s included
    /// 6. **Request ID** - generated/propagated for all requests
    /// 7. **Health probes** - routes added after the layers, so never
    ///    throttled
    /// 8. **Panic catching** - outermost, catches everything below
    ///
    /// The ordering of 3-5 is what gives the composition its guarantees:
    /// the throttle layer sits inside CORS and the security headers, so a
    /// rejected request still produces a response carrying both.
    ///
    /// # Errors
    ///
    /// Currently infallible in practice; the `Result` return leaves room for
    /// layers that can fail to build.
    ///
    /// # Panics
    ///
    /// Must run inside a Tokio runtime (the rate limiter sweep task is
    /// spawned here).
    pub fn setup_middleware(self) -> Result<Self> {
        const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");
        const VERSION: &str = env!("CARGO_PKG_VERSION");
        tracing::info!("Starting {PACKAGE_NAME} version {VERSION}...");

        let router = self
            .setup_logging() // 1. Request/response logging
            .setup_timeout() // 2. Request timeout (optional)
            .setup_rate_limiting() // 3. Reject excess traffic early
            .setup_cors() // 4. CORS handling
            .setup_security_headers() // 5. Defensive headers on everything
            .setup_request_id() // 6. Correlation ids for all requests
            .setup_probes() // 7. Health probes (never throttled)
            .setup_catch_panic(); // 8. Outermost - panic recovery

        Ok(router)
    }

    /// Starts the HTTP server based on the current configuration.
    ///
    /// # Graceful Shutdown
    ///
    /// When a shutdown signal is received (SIGTERM or Ctrl+C), the server:
    ///
    /// 1. Triggers the cancellation token (stopping background tasks)
    /// 2. Stops accepting new connections
    /// 3. Waits for in-flight requests to complete, up to
    ///    `http.shutdown_timeout`
    /// 4. Exits, forcing shutdown if the timeout expires first
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.http.full_bind_addr();
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Bound to {}", &bind_addr);
        tracing::info!("Max requests/window: {}", self.config.rate_limit.max_requests);

        let service = self
            .inner
            .with_state(self.state)
            .into_make_service_with_connect_info::<SocketAddr>();

        let shutdown_timeout = self.config.http.shutdown_timeout;
        let cancel_token = self.cancel_token.clone();

        // Keep the sweeper alive for as long as the server runs
        let _limiter_sweeper = self.limiter_sweeper;

        let serve_future = axum::serve(listener, service)
            .with_graceful_shutdown(shutdown_signal(shutdown_timeout, cancel_token.clone()));

        tokio::select! {
            result = serve_future => {
                tracing::info!("Graceful shutdown completed");
                result?;
            }
            _ = async {
                cancel_token.cancelled().await;
                tokio::time::sleep(shutdown_timeout).await;
            } => {
                tracing::warn!("Graceful shutdown timeout expired, forcing shutdown");
            }
        }

        Ok(())
    }

    /// Adds a custom Tower middleware layer to the router.
    ///
    /// This is a low-level method that forwards to `axum::Router::layer()`,
    /// for middleware this library does not provide.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request<Body>> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request<Body>>>::Response: axum::response::IntoResponse + 'static,
        <L::Service as Service<Request<Body>>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request<Body>>>::Future: Send + 'static,
    {
        self.inner = self.inner.layer(layer);
        self
    }

    /// Adds a new route to the router at the specified path.
    ///
    /// # Examples
    ///
    /// ```
    /// use replyguard::{Config, FluentRouter};
    /// use axum::routing::get;
    ///
    /// async fn handler() -> &'static str {
    ///     "Hello, World!"
    /// }
    ///
    /// # fn example() {
    /// let router = FluentRouter::without_state(Config::default())
    ///     .unwrap()
    ///     .route("/hello", get(handler))
    ///     .into_inner();
    /// # }
    /// ```
    #[must_use]
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter<State>) -> Self {
        self.inner = self.inner.route(path, route);
        self
    }

    /// Nests another router at a specific path prefix.
    #[must_use]
    pub fn nest(mut self, path: &str, router: Router<State>) -> Self {
        self.inner = self.inner.nest(path, router);
        self
    }

    /// Merges another router into this one.
    ///
    /// Routes from the other router are added at the same level, without a
    /// prefix. This is the usual way to attach the generation routes:
    ///
    /// ```rust,no_run
    /// # use replyguard::{Config, FluentRouter};
    /// # fn example(generation_routes: axum::Router) -> replyguard::Result<()> {
    /// FluentRouter::without_state(Config::default())?
    ///     .merge(generation_routes)
    ///     .setup_middleware()?;
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn merge(mut self, other: Router<State>) -> Self {
        self.inner = self.inner.merge(other);
        self
    }

    /// Consumes the `FluentRouter` and returns the underlying `axum::Router`.
    ///
    /// Use this for testing with `tower::ServiceExt::oneshot` or when another
    /// component needs the concrete `Router` type.
    pub fn into_inner(self) -> Router<State> {
        self.inner
    }
}

/// Waits for SIGTERM or Ctrl+C, then triggers the cancellation token and
/// returns so axum can begin graceful shutdown. The timeout itself is
/// enforced by the caller.
///
/// If signal registration fails, the function logs a warning and waits
/// indefinitely, so the server keeps running even in restricted environments.
async fn shutdown_signal(timeout: Duration, cancel_token: CancellationToken) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {
                tracing::debug!("Ctrl+C signal received");
            }
            Err(err) => {
                tracing::warn!("Failed to install Ctrl+C handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal_handler) => {
                signal_handler.recv().await;
                tracing::debug!("SIGTERM signal received");
            }
            Err(err) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!(
        "Shutdown signal received, starting graceful shutdown (timeout: {}s)",
        timeout.as_secs()
    );
    cancel_token.cancel();
}
