//! # Scripting Errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::connection::ConnectionError;

/// Result type for scripting operations
pub type ScriptingResult<T> = Result<T, ScriptingError>;

/// Scripting errors
#[derive(Debug, Error)]
pub enum ScriptingError {
    /// Missing connection, unknown DBMS name, or missing script directory
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("can't read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Interpreted script failed to evaluate
    #[error("error at line {line}: {message}")]
    Script { line: u32, message: String },

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ScriptingError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn script(line: u32, message: impl Into<String>) -> Self {
        Self::Script {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn lock_poisoned() -> Self {
        Self::Internal("Lock poisoned".into())
    }

    /// Stable error code for CLI output
    pub fn code(&self) -> &'static str {
        match self {
            ScriptingError::Configuration(_) => "DBS_CONFIGURATION",
            ScriptingError::Io { .. } => "DBS_IO",
            ScriptingError::Script { .. } => "DBS_SCRIPT",
            ScriptingError::Connection(_) => "DBS_CONNECTION",
            ScriptingError::Internal(_) => "DBS_INTERNAL",
        }
    }
}
