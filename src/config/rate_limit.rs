use serde::Deserialize;
use std::time::Duration;

use crate::Result;

/// Configuration for the fixed-window rate limiters.
///
/// Two limits exist because bulk requests are N times as expensive as single
/// generations: the default limit guards the whole API surface, the bulk
/// limit is layered additionally onto bulk endpoints.
///
/// ```toml
/// [rate_limit]
/// max_requests = 30
/// window = "1m"
/// bulk_max_requests = 5
/// bulk_window = "1m"
/// sweep_interval = "5m"
/// ```
///
/// Setting `max_requests = 0` disables the router-wide limiter entirely
/// (useful in tests); the bulk limiter is only attached to bulk routes.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per identifier per window on standard endpoints.
    #[serde(default = "RateLimitConfig::default_max_requests")]
    pub max_requests: u32,

    /// Window length for standard endpoints.
    #[serde(
        default = "RateLimitConfig::default_window",
        with = "humantime_serde"
    )]
    pub window: Duration,

    /// Requests allowed per identifier per window on bulk endpoints.
    #[serde(default = "RateLimitConfig::default_bulk_max_requests")]
    pub bulk_max_requests: u32,

    /// Window length for bulk endpoints.
    #[serde(
        default = "RateLimitConfig::default_window",
        with = "humantime_serde"
    )]
    pub bulk_window: Duration,

    /// How often expired limiter records are swept.
    #[serde(
        default = "RateLimitConfig::default_sweep_interval",
        with = "humantime_serde"
    )]
    pub sweep_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: Self::default_max_requests(),
            window: Self::default_window(),
            bulk_max_requests: Self::default_bulk_max_requests(),
            bulk_window: Self::default_window(),
            sweep_interval: Self::default_sweep_interval(),
        }
    }
}

impl RateLimitConfig {
    fn default_max_requests() -> u32 {
        30
    }

    fn default_bulk_max_requests() -> u32 {
        5
    }

    fn default_window() -> Duration {
        Duration::from_secs(60)
    }

    fn default_sweep_interval() -> Duration {
        Duration::from_secs(300)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window.is_zero() || self.bulk_window.is_zero() {
            return Err(crate::Error::config(
                "[rate_limit] window and bulk_window must be non-zero durations",
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(crate::Error::config(
                "[rate_limit] sweep_interval must be a non-zero duration",
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
        let config = RateLimitConfig::default();
        assert_eq!(config.max_requests, 30);
        assert_eq!(config.window, Duration::from_secs(60));
        assert_eq!(config.bulk_max_requests, 5);
        assert_eq!(config.bulk_window, Duration::from_secs(60));
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parses_from_toml() {
        let config: Config = r#"
[rate_limit]
max_requests = 100
window = "10s"
bulk_max_requests = 2
bulk_window = "30s"
sweep_interval = "1m"
        "#
        .parse()
        .unwrap();

        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window, Duration::from_secs(10));
        assert_eq!(config.rate_limit.bulk_max_requests, 2);
        assert_eq!(config.rate_limit.bulk_window, Duration::from_secs(30));
        assert_eq!(config.rate_limit.sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_zero_window_fails_validation() {
        let config: Config = r#"
[rate_limit]
window = "0s"
        "#
        .parse()
        .unwrap();
        assert!(config.rate_limit.validate().is_err());
    }

    #[test]
    fn test_zero_max_requests_is_allowed() {
        // 0 disables the router-wide limiter rather than failing validation
        let config: Config = r#"
[rate_limit]
max_requests = 0
        "#
        .parse()
        .unwrap();
        assert!(config.rate_limit.validate().is_ok());
    }
}
