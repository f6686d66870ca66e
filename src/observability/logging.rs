//! Subscriber installation
//!
//! Logs go to stderr so that command output on stdout stays machine
//! readable.

use std::fmt;
use std::io;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt as subscriber_fmt, EnvFilter};

use super::{ObservabilityError, ObservabilityResult};

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = ObservabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ObservabilityError::InvalidFormat(other.to_string())),
        }
    }
}

/// Parse a filter directive such as `info` or `dbscripts=debug`
pub fn parse_filter(level: &str) -> ObservabilityResult<EnvFilter> {
    EnvFilter::try_new(level).map_err(|e| ObservabilityError::InvalidLevel(e.to_string()))
}

/// Install the global subscriber.
///
/// Fails if `level` is not a valid filter directive or a subscriber is
/// already installed.
pub fn init_logging(level: &str, format: LogFormat) -> ObservabilityResult<()> {
    let filter = parse_filter(level)?;

    let installed = match format {
        LogFormat::Text => subscriber_fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(true)
            .try_init(),
        LogFormat::Json => subscriber_fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_current_span(false)
            .try_init(),
    };

    installed.map_err(|_| ObservabilityError::AlreadyInitialized)
}
