//! Core FluentRouter struct and initialization methods.

use tokio_util::{sync::CancellationToken, task::AbortOnDropHandle};

use {
    crate::{Config, Middleware, Result},
    axum::Router,
};

/// Fluent builder for `axum::Router` with configuration-based middleware setup.
///
/// This wrapper around `axum::Router` provides a fluent API for configuring
/// middleware and routes based on the application configuration. Create
/// instances using [`FluentRouter::without_state`] or
/// [`FluentRouter::with_state`], add routes, then call
/// [`FluentRouter::setup_middleware`](crate::FluentRouter::setup_middleware)
/// to install the full stack.
///
/// The router owns the background sweep task for the router-wide rate
/// limiter; dropping the router aborts the sweep. Long-running components can
/// observe shutdown through [`FluentRouter::cancellation_token`].
///
/// ```rust,no_run
/// use axum::routing::get;
/// use replyguard::{Config, FluentRouter, Result};
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let config = Config::default();
///     config.setup_tracing();
///
///     FluentRouter::without_state(config)?
///         .route("/", get(|| async { "ok" }))
///         .setup_middleware()?
///         .start()
///         .await
/// }
/// ```
pub struct FluentRouter<State = ()> {
    pub(crate) config: Config,
    pub(crate) state: State,
    pub(crate) inner: Router<State>,
    pub(crate) limiter_sweeper: Option<AbortOnDropHandle<()>>,
    pub(crate) cancel_token: CancellationToken,
}

impl FluentRouter {
    /// Creates a new `FluentRouter` without application state.
    pub fn without_state(config: Config) -> Result<FluentRouter<()>> {
        FluentRouter::<()>::with_state(config, ())
    }
}

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Creates a new `FluentRouter` with the provided configuration and state.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn with_state<S: Clone + Send + Sync + 'static>(
        config: Config,
        state: S,
    ) -> Result<FluentRouter<S>> {
        config.validate()?;

        Ok(FluentRouter {
            config,
            state,
            inner: Router::new(),
            limiter_sweeper: None,
            cancel_token: CancellationToken::new(),
        })
    }

    /// Returns a cancellation token that is triggered when shutdown begins.
    ///
    /// Hand clones of this token to background tasks so they stop alongside
    /// the server:
    ///
    /// ```rust,no_run
    /// # use replyguard::{Config, FluentRouter};
    /// # fn example() -> replyguard::Result<()> {
    /// let router = FluentRouter::without_state(Config::default())?;
    /// let token = router.cancellation_token();
    /// tokio::spawn(async move {
    ///     token.cancelled().await;
    ///     // flush, close, etc.
    /// });
    /// # Ok(())
    /// # }
    /// ```
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Returns a reference to the configuration this router was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether a middleware layer is enabled by the `[http]` include/exclude
    /// selection. Absent configuration enables everything.
    pub(crate) fn is_middleware_enabled(&self, middleware: Middleware) -> bool {
        self.config
            .http
            .middleware
            .as_ref()
            .map(|m| m.is_enabled(middleware))
            .unwrap_or(true)
    }
}
