//! Observable events of the scripting engine
//!
//! Every log line emitted by the library carries one of these as its
//! `event` field, so log consumers can filter on a closed set of names.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// CLI configuration loaded
    ConfigLoaded,

    // Resolution
    /// DBMS script root found on disk (cache miss)
    ScriptRootResolved,
    /// Script directory scanned into the store
    ScriptDirScanned,
    /// No script registered for the requested object type
    ScriptMissing,

    // Execution
    /// Script execution begins
    ExecutionStart,
    /// Script execution finished, results collected
    ExecutionComplete,
    /// Script execution failed
    ExecutionFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::ScriptRootResolved => "SCRIPT_ROOT_RESOLVED",
            Event::ScriptDirScanned => "SCRIPT_DIR_SCANNED",
            Event::ScriptMissing => "SCRIPT_MISSING",

            Event::ExecutionStart => "EXECUTION_BEGIN",
            Event::ExecutionComplete => "EXECUTION_COMPLETE",
            Event::ExecutionFailed => "EXECUTION_FAILED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
