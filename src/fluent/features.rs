//! Feature middleware: CORS, defensive response headers and health probes.

use super::router::FluentRouter;
use crate::{Middleware, XFrameOptions};

use {
    axum::{
        body::Body,
        middleware::{self, Next},
        routing::get,
    },
    http::{HeaderValue, Request},
    tower_http::cors::{AllowOrigin, CorsLayer},
};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up Cross-Origin Resource Sharing (CORS) middleware.
    ///
    /// When `[http.cors]` carries an allow-list, only listed origins are
    /// reflected into CORS response headers, together with the configured
    /// methods, headers and preflight cache lifetime. The allow-list accepts
    /// either a TOML array or a comma-separated string, so it can come
    /// straight from an environment variable:
    ///
    /// ```toml
    /// [http.cors]
    /// allowed_origins = "{{ CORS_ALLOWED_ORIGINS }}"
    /// allowed_methods = ["GET", "POST", "OPTIONS"]
    /// exposed_headers = ["x-ratelimit-remaining"]
    /// max_age = "1h"
    /// ```
    ///
    /// # Security Considerations
    ///
    /// - When `allow_credentials` is `true`, wildcard origins are not allowed
    /// - Without any CORS configuration, production environments fall back to
    ///   a restrictive same-origin policy and development environments to
    ///   permissive defaults, both with a warning
    #[must_use]
    pub fn setup_cors(mut self) -> Self {
        if !self.is_middleware_enabled(Middleware::Cors) {
            return self;
        }

        if let Some(cors_config) = &self.config.http.cors {
            let mut cors = CorsLayer::new();

            // By default we do NOT allow credentials
            let has_credentials = cors_config.allow_credentials.unwrap_or(false);

            match cors_config.origins() {
                Some(origins) => {
                    // Only listed origins are reflected; an empty list (e.g. a
                    // missing env var) allows no cross-origin access at all
                    let list: Vec<HeaderValue> = origins
                        .iter()
                        .filter_map(|origin| HeaderValue::from_str(origin).ok())
                        .collect();
                    cors = cors.allow_origin(AllowOrigin::list(list));
                }
                None if !has_credentials => {
                    cors = cors.allow_origin(tower_http::cors::Any);
                }
                None => {}
            }

            if let Some(methods) = &cors_config.allowed_methods {
                let method_list: Vec<http::Method> =
                    methods.iter().map(|m| m.0.clone()).collect();
                cors = cors.allow_methods(method_list);
            } else if !has_credentials {
                cors = cors.allow_methods(tower_http::cors::Any);
            }

            if let Some(headers) = &cors_config.allowed_headers {
                let header_list: Vec<http::HeaderName> =
                    headers.iter().map(|h| h.0.clone()).collect();
                cors = cors.allow_headers(header_list);
            } else if !has_credentials {
                cors = cors.allow_headers(tower_http::cors::Any);
            }

            if let Some(headers) = &cors_config.exposed_headers {
                let header_list: Vec<http::HeaderName> =
                    headers.iter().map(|h| h.0.clone()).collect();
                cors = cors.expose_headers(header_list);
            }

            if let Some(max_age) = cors_config.max_age {
                cors = cors.max_age(max_age);
            }

            // Must be set last, after origins/methods/headers
            if has_credentials {
                cors = cors.allow_credentials(true);
            }

            self.inner = self.inner.layer(cors);
        } else {
            let rust_env = std::env::var("RUST_ENV").unwrap_or_default().to_lowercase();
            let is_production = rust_env.is_empty()
                || rust_env == "prod"
                || rust_env == "production"
                || rust_env == "release";

            if is_production {
                tracing::warn!(
                    "No CORS configuration found in production environment. \
                     Using restrictive same-origin policy. Configure [http.cors] \
                     in your config file to allow cross-origin requests."
                );
                self.inner = self.inner.layer(CorsLayer::new());
            } else {
                tracing::warn!(
                    "No CORS configuration found (RUST_ENV={}). Using permissive defaults. \
                     This is NOT safe for production - configure explicit CORS rules.",
                    rust_env
                );
                self.inner = self.inner.layer(CorsLayer::very_permissive());
            }
        }
        self
    }

    /// Sets up the fixed defensive response headers.
    ///
    /// Every response passing through this layer is stamped with:
    /// - `X-Content-Type-Options: nosniff` (unless disabled in config)
    /// - `X-Frame-Options` (`DENY` by default)
    /// - `X-XSS-Protection: 1; mode=block`
    /// - `Referrer-Policy: strict-origin-when-cross-origin`
    /// - `Permissions-Policy: camera=(), microphone=(), geolocation=()`
    ///
    /// Installed outside the throttle layer by `setup_middleware()`, so rate
    /// limit rejections carry the headers too.
    ///
    /// # Configuration
    ///
    /// ```toml
    /// [http]
    /// x_content_type_nosniff = true  # Default
    /// x_frame_options = "DENY"       # Default: DENY or SAMEORIGIN
    /// ```
    #[must_use]
    pub fn setup_security_headers(mut self) -> Self {
        if !self.is_middleware_enabled(Middleware::SecurityHeaders) {
            return self;
        }

        let nosniff = self.config.http.x_content_type_nosniff;
        let x_frame = match self.config.http.x_frame_options {
            XFrameOptions::Deny => HeaderValue::from_static("DENY"),
            XFrameOptions::SameOrigin => HeaderValue::from_static("SAMEORIGIN"),
        };

        self.inner = self.inner.layer(middleware::from_fn(
            move |req: Request<Body>, next: Next| {
                let x_frame = x_frame.clone();
                async move {
                    let mut response = next.run(req).await;
                    let headers = response.headers_mut();
                    if nosniff {
                        headers.insert(
                            "x-content-type-options",
                            HeaderValue::from_static("nosniff"),
                        );
                    }
                    headers.insert("x-frame-options", x_frame);
                    headers.insert(
                        "x-xss-protection",
                        HeaderValue::from_static("1; mode=block"),
                    );
                    headers.insert(
                        "referrer-policy",
                        HeaderValue::from_static("strict-origin-when-cross-origin"),
                    );
                    headers.insert(
                        "permissions-policy",
                        HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
                    );
                    response
                }
            },
        ));
        self
    }

    /// Sets up health probe endpoints.
    ///
    /// Adds two endpoints for orchestrator probes:
    /// - **Liveness** - always returns 200 OK (the process is running)
    /// - **Readiness** - returns 200 OK when the service can take traffic
    ///
    /// These routes are added after the throttle layer on purpose: health
    /// checks must never be rate limited.
    ///
    /// # Configuration
    ///
    /// ```toml
    /// [http]
    /// liveness_route = "/live"   # Default
    /// readiness_route = "/ready" # Default
    /// ```
    #[must_use]
    pub fn setup_probes(mut self) -> Self {
        if self.is_middleware_enabled(Middleware::Liveness) {
            let route = self.config.http.liveness_route.clone();
            self.inner = self.inner.route(&route, get(|| async { "OK\n" }));
        }

        if self.is_middleware_enabled(Middleware::Readiness) {
            let route = self.config.http.readiness_route.clone();
            self.inner = self.inner.route(&route, get(|| async { "OK\n" }));
        }
        self
    }
}
