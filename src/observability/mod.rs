//! Observability for the scripting engine
//!
//! Structured logging goes through `tracing`. Library code tags each event
//! with a typed [`Event`] name:
//!
//! ```ignore
//! use tracing::info;
//! use dbscripts::observability::Event;
//!
//! info!(event = %Event::ScriptDirScanned, scripts = 12, "scanned script directory");
//! ```
//!
//! The binary installs a subscriber once with [`init_logging`].

mod events;
mod logging;

pub use events::Event;
pub use logging::{init_logging, parse_filter, LogFormat};

use thiserror::Error;

/// Result type for observability setup
pub type ObservabilityResult<T> = Result<T, ObservabilityError>;

/// Observability setup errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservabilityError {
    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    #[error("invalid log format '{0}' (expected text or json)")]
    InvalidFormat(String),

    #[error("logging already initialized")]
    AlreadyInitialized,
}

impl ObservabilityError {
    /// Stable error code for CLI output
    pub fn code(&self) -> &'static str {
        "DBS_OBSERVABILITY_FAILED"
    }
}
