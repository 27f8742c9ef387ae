//!
//! Configuration structures and utilities for wiring up the service.
//!
//! A configuration can be created in many ways:
//! - From an environment-specific TOML file via `Config::from_rust_env` or `Config::from_toml_file`
//! - From a TOML string via `Config::from_toml`
//! - Constructed programmatically via the builder methods on `Config`
//!
//! In both TOML-based methods, environment variables can be referenced in the
//! TOML using the {{ VAR_NAME }} syntax and are substituted before parsing.
//! This is how the encryption passphrase and the CORS allow-list stay out of
//! checked-in files.
//!
//! Configuration is split into logical sections, each with its own struct:
//!
//! - `HttpConfig` for HTTP server settings and security headers
//! - `SecurityConfig` for the encryption passphrase
//! - `RateLimitConfig` for the fixed-window limiters
//! - `CacheConfig` for the response cache
//! - `LoggingConfig` for logging and tracing settings
//!
mod cache;
mod cors;
mod http;
mod logging;
mod middleware;
mod rate_limit;
mod security;

pub use cache::*;
pub use cors::*;
pub use http::*;
pub use logging::*;
pub use middleware::*;
pub use rate_limit::*;
pub use security::*;

use {
    crate::{Error, Result, SecretVault, utils::replace_handlebars_with_env},
    serde::Deserialize,
    std::{env, fs, str::FromStr, time::Duration},
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    ///
    /// Creates a default configuration.
    /// This will attempt to load configuration from the file based on the RUST_ENV
    /// environment variable falling back to built-in defaults if the environment
    /// variable is not set. Configuration files should be located in the "config/"
    /// directory of your project.
    ///
    fn default() -> Self {
        match Self::from_rust_env() {
            Ok(config) => config,
            Err(_) => Config {
                http: HttpConfig::default(),
                security: SecurityConfig::default(),
                rate_limit: RateLimitConfig::default(),
                cache: CacheConfig::default(),
                logging: LoggingConfig::default(),
            },
        }
    }
}

impl Config {
    ///
    /// Loads the configuration from a file based on the RUST_ENV environment variable.
    ///
    pub fn from_rust_env() -> Result<Config> {
        Self::from_toml_file(env::var("RUST_ENV")?)
    }

    ///
    /// Given an environment name, loads the corresponding configuration file,
    /// substitutes any environment variables, and returns a Config struct.
    /// The configuration file is expected to be located at "config/{env}.toml"
    /// where {env} is the provided environment name (e.g., "dev", "prod").
    ///
    pub fn from_toml_file(env: impl AsRef<str>) -> Result<Config> {
        let path = format!("config/{}.toml", env.as_ref());
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    ///
    /// Parses a configuration string in TOML format into a Config struct.
    ///
    pub fn from_toml(toml_str: &str) -> Result<Config> {
        toml_str.parse()
    }

    /// Sets the HTTP server bind address of the HttpConfig.
    pub fn with_bind_addr<S: AsRef<str>>(mut self, addr: S) -> Self {
        self.http.bind_addr = addr.as_ref().into();
        self
    }

    /// Sets the HTTP server bind port of the HttpConfig.
    pub fn with_bind_port(mut self, port: u16) -> Self {
        self.http.bind_port = port;
        self
    }

    /// Sets the request timeout duration of the HttpConfig.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.http.request_timeout = Some(timeout);
        self
    }

    /// Sets the X-Frame-Options header configuration of the HttpConfig.
    pub fn with_x_frame_options(mut self, x_frame: XFrameOptions) -> Self {
        self.http.x_frame_options = x_frame;
        self
    }

    /// Enables or disables the X-Content-Type-Options header in the HttpConfig.
    pub fn with_x_content_type_nosniff(mut self, enable: bool) -> Self {
        self.http.x_content_type_nosniff = enable;
        self
    }

    /// Sets the liveness route path of the HttpConfig.
    pub fn with_liveness_route(mut self, route: &str) -> Self {
        self.http.liveness_route = route.into();
        self
    }

    /// Sets the readiness route path of the HttpConfig.
    pub fn with_readiness_route(mut self, route: &str) -> Self {
        self.http.readiness_route = route.into();
        self
    }

    /// Sets the CORS configuration of the HttpConfig.
    /// Without explicit CORS configuration, cross-origin access depends on
    /// the environment (restrictive in production, permissive in development).
    pub fn with_cors_config(mut self, cors_config: HttpCorsConfig) -> Self {
        self.http.cors = Some(cors_config);
        self
    }

    /// Sets the middleware configuration of the HttpConfig.
    /// This approach activates only the specified middlewares.
    pub fn with_included_middlewares(mut self, middlewares: Vec<Middleware>) -> Self {
        self.http.middleware = Some(MiddlewareConfig::Include(middlewares));
        self
    }

    /// Sets the middleware configuration of the HttpConfig.
    /// This approach activates all middlewares except the specified ones.
    pub fn with_excluded_middlewares(mut self, middlewares: Vec<Middleware>) -> Self {
        self.http.middleware = Some(MiddlewareConfig::Exclude(middlewares));
        self
    }

    /// Sets the standard per-window request cap of the RateLimitConfig.
    pub fn with_max_requests(mut self, max: u32) -> Self {
        self.rate_limit.max_requests = max;
        self
    }

    /// Sets the standard window length of the RateLimitConfig.
    pub fn with_rate_limit_window(mut self, window: Duration) -> Self {
        self.rate_limit.window = window;
        self
    }

    /// Sets the bulk per-window request cap of the RateLimitConfig.
    pub fn with_bulk_max_requests(mut self, max: u32) -> Self {
        self.rate_limit.bulk_max_requests = max;
        self
    }

    /// Sets the response cache capacity of the CacheConfig.
    pub fn with_cache_max_entries(mut self, max_entries: usize) -> Self {
        self.cache.max_entries = max_entries;
        self
    }

    /// Sets the default response cache TTL of the CacheConfig.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache.ttl = ttl;
        self
    }

    /// Sets the encryption passphrase of the SecurityConfig.
    pub fn with_encryption_secret(mut self, secret: &str) -> Self {
        self.security.encryption_secret = Some(crate::Sensitive::from(secret));
        self
    }

    /// Sets the log format of the LoggingConfig.
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.logging.format = format;
        self
    }

    /// Ensures that the configuration is valid.
    /// Most configuration values are either optional or have sensible defaults;
    /// here we ensure the ones with hard requirements are satisfied.
    pub fn validate(&self) -> Result<()> {
        self.http.validate()?;
        self.security.validate()?;
        self.rate_limit.validate()?;
        self.cache.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    ///
    /// Sets up the tracing subscriber for logging based on the LoggingConfig.
    ///
    /// NOTE: This should be called early during startup to ensure logging is
    ///       configured before any log messages are emitted.
    ///
    pub fn setup_tracing(&self) {
        use tracing_subscriber::{EnvFilter, prelude::*};
        let env_filter = EnvFilter::from_default_env();
        match self.logging.format {
            LogFormat::Json => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer().json())
                    .with(env_filter)
                    .try_init();
            }
            LogFormat::Default => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer())
                    .with(env_filter)
                    .try_init();
            }
            LogFormat::Compact => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer().compact())
                    .with(env_filter)
                    .try_init();
            }
            LogFormat::Pretty => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer().pretty())
                    .with(env_filter)
                    .try_init();
            }
        }
    }

    ///
    /// Builds a [`SecretVault`] from the `[security]` section, falling back to
    /// the `ENCRYPTION_SECRET` environment variable when the section carries
    /// no usable passphrase.
    ///
    pub fn create_secret_vault(&self) -> Result<SecretVault> {
        match self.security.secret() {
            Some(secret) => SecretVault::new(secret),
            None => SecretVault::from_env(),
        }
    }
}

///
/// Parses a configuration string with references to environment variables
/// into a Config struct by substituting the environment variables and then
/// parsing the resulting TOML.
///
impl FromStr for Config {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let config_file = replace_handlebars_with_env(s);
        let config = toml::from_str::<Config>(&config_file)?;
        Ok(config)
    }
}
