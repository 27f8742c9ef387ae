use serde::Deserialize;
use std::{fmt, time::Duration};

use super::{HttpCorsConfig, MiddlewareConfig};
use crate::Result;

/// X-Frame-Options header value configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum XFrameOptions {
    /// Prevents the page from being displayed in a frame
    #[default]
    Deny,
    /// Allows the page to be displayed in a frame on the same origin
    SameOrigin,
}

impl fmt::Display for XFrameOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XFrameOptions::Deny => write!(f, "DENY"),
            XFrameOptions::SameOrigin => write!(f, "SAMEORIGIN"),
        }
    }
}

///
/// Configuration for the HTTP server.
///
/// Covers binding, timeouts, probe routes, the defensive response headers
/// and CORS. Rate limiting and caching have their own top-level sections.
///
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// IP address to bind the HTTP server to.
    /// The default `bind_addr` is "127.0.0.1".
    #[serde(default = "HttpConfig::default_bind_addr")]
    pub bind_addr: String,

    /// Port to bind the HTTP server to.
    /// The default `bind_port` is 3000.
    #[serde(default = "HttpConfig::default_bind_port")]
    pub bind_port: u16,

    /// Maximum allowed time for a request to complete before timing out
    /// with a 408 Request Timeout. By default `request_timeout` is None.
    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,

    /// Route for liveness checks. Defaults to "/live".
    #[serde(default = "HttpConfig::default_liveness_route")]
    pub liveness_route: String,

    /// Route for readiness checks. Defaults to "/ready".
    #[serde(default = "HttpConfig::default_readiness_route")]
    pub readiness_route: String,

    /// Whether to set the X-Content-Type-Options header to "nosniff".
    /// Defaults to true.
    #[serde(default = "HttpConfig::default_x_content_type_nosniff")]
    pub x_content_type_nosniff: bool,

    /// X-Frame-Options header value: "DENY" or "SAMEORIGIN". Defaults to DENY.
    #[serde(default)]
    pub x_frame_options: XFrameOptions,

    /// CORS configuration. When absent, cross-origin access depends on the
    /// environment (restrictive in production, permissive in development).
    pub cors: Option<HttpCorsConfig>,

    /// Maximum time to wait for graceful shutdown before forcing exit.
    /// Defaults to 30 seconds.
    #[serde(
        default = "HttpConfig::default_shutdown_timeout",
        with = "humantime_serde"
    )]
    pub shutdown_timeout: Duration,

    /// Middleware include/exclude selection. Absent means everything is on.
    #[serde(flatten)]
    pub middleware: Option<MiddlewareConfig>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        // Matches an empty [http] TOML section
        Self {
            bind_addr: Self::default_bind_addr(),
            bind_port: Self::default_bind_port(),
            request_timeout: None,
            liveness_route: Self::default_liveness_route(),
            readiness_route: Self::default_readiness_route(),
            x_content_type_nosniff: Self::default_x_content_type_nosniff(),
            x_frame_options: XFrameOptions::default(),
            cors: None,
            shutdown_timeout: Self::default_shutdown_timeout(),
            middleware: None,
        }
    }
}

impl HttpConfig {
    ///
    /// Returns the full bind address as a string in the format "IP:PORT".
    ///
    pub fn full_bind_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.bind_port)
    }

    fn default_bind_addr() -> String {
        "127.0.0.1".into()
    }

    fn default_bind_port() -> u16 {
        3000
    }

    fn default_liveness_route() -> String {
        "/live".into()
    }

    fn default_readiness_route() -> String {
        "/ready".into()
    }

    fn default_x_content_type_nosniff() -> bool {
        true
    }

    fn default_shutdown_timeout() -> Duration {
        Duration::from_secs(30)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.trim().is_empty() {
            return Err(crate::Error::config(
                "HTTP bind_addr is required. Set [http] bind_addr = \"0.0.0.0\" or \"127.0.0.1\" in config.",
            ));
        }

        if self.bind_addr.parse::<std::net::IpAddr>().is_err() {
            return Err(crate::Error::config(
                "HTTP bind_addr must be a valid IP address. Examples: \"127.0.0.1\", \"0.0.0.0\", \"::1\"",
            ));
        }

        if !self.liveness_route.starts_with('/') || !self.readiness_route.starts_with('/') {
            return Err(crate::Error::config(
                "Probe routes must start with '/'. Examples: \"/live\", \"/ready\"",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    #[test]
    fn test_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.bind_port, 3000);
        assert_eq!(config.full_bind_addr(), "127.0.0.1:3000");
        assert_eq!(config.liveness_route, "/live");
        assert_eq!(config.readiness_route, "/ready");
        assert!(config.x_content_type_nosniff);
        assert!(matches!(config.x_frame_options, XFrameOptions::Deny));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_parses_full_section() {
        let config: Config = r#"
[http]
bind_addr = "0.0.0.0"
bind_port = 8080
request_timeout = "30s"
liveness_route = "/health"
x_frame_options = "SAMEORIGIN"
x_content_type_nosniff = false
        "#
        .parse()
        .unwrap();

        assert_eq!(config.http.bind_addr, "0.0.0.0");
        assert_eq!(config.http.bind_port, 8080);
        assert_eq!(config.http.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.http.liveness_route, "/health");
        assert!(matches!(
            config.http.x_frame_options,
            XFrameOptions::SameOrigin
        ));
        assert!(!config.http.x_content_type_nosniff);
    }

    #[test]
    fn test_x_frame_options_display() {
        assert_eq!(XFrameOptions::Deny.to_string(), "DENY");
        assert_eq!(XFrameOptions::SameOrigin.to_string(), "SAMEORIGIN");
    }

    #[test]
    fn test_validate_empty_bind_addr() {
        let mut config = HttpConfig::default();
        config.bind_addr = "".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_bind_addr() {
        let mut config = HttpConfig::default();
        config.bind_addr = "not-an-ip".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ipv6_bind_addr() {
        let mut config = HttpConfig::default();
        config.bind_addr = "::1".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_probe_routes_must_be_absolute() {
        let mut config = HttpConfig::default();
        config.liveness_route = "live".into();
        assert!(config.validate().is_err());
    }
}
