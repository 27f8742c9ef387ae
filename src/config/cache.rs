use serde::Deserialize;
use std::time::Duration;

use crate::Result;

/// Configuration for the generation response cache.
///
/// ```toml
/// [cache]
/// max_entries = 50
/// ttl = "10m"
/// sweep_interval = "5m"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached responses. The oldest insertion is evicted
    /// when a new key arrives at capacity.
    #[serde(default = "CacheConfig::default_max_entries")]
    pub max_entries: usize,

    /// Default time-to-live for cached responses.
    #[serde(default = "CacheConfig::default_ttl", with = "humantime_serde")]
    pub ttl: Duration,

    /// How often expired entries are swept.
    #[serde(
        default = "CacheConfig::default_sweep_interval",
        with = "humantime_serde"
    )]
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: Self::default_max_entries(),
            ttl: Self::default_ttl(),
            sweep_interval: Self::default_sweep_interval(),
        }
    }
}

impl CacheConfig {
    fn default_max_entries() -> usize {
        50
    }

    fn default_ttl() -> Duration {
        Duration::from_secs(600)
    }

    fn default_sweep_interval() -> Duration {
        Duration::from_secs(300)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(crate::Error::config(
                "[cache] max_entries must be at least 1",
            ));
        }
        if self.ttl.is_zero() || self.sweep_interval.is_zero() {
            return Err(crate::Error::config(
                "[cache] ttl and sweep_interval must be non-zero durations",
            ));
        }
        Ok(())
    }
}
