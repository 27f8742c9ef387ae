use serde::Deserialize;

use crate::Result;

/// Log output format selection.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Structured JSON lines, one event per line.
    Json,
    /// Human-readable default formatting.
    #[default]
    Default,
    /// Compact single-line formatting.
    Compact,
    /// Multi-line pretty formatting for local development.
    Pretty,
}

/// Configuration for logging and tracing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Output format. Defaults to `default`.
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}
