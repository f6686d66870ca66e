//! # Database Connections
//!
//! The connection collaborator the scripting engine runs against. The
//! engine never depends on a concrete driver; it only needs the capability
//! set below.

pub mod sqlite;
pub mod table;

use thiserror::Error;

pub use sqlite::SqliteConnection;
pub use table::{Column, DataTable, Value};

/// Result type for connection operations
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// Connection-level failures, surfaced to callers unchanged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("failed to open connection: {0}")]
    Open(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// A live database connection
pub trait Connection {
    /// Open the connection. Calling it on an open connection is a no-op.
    fn open(&mut self) -> ConnectionResult<()>;

    /// DBMS product name, empty when unknown
    fn dbms_name(&self) -> String;

    /// DBMS version string, empty when unknown
    fn dbms_version(&self) -> String;

    /// Integer surrogate of the DBMS version used for script segment selection
    fn dbms_comparable_version(&mut self) -> ConnectionResult<i64>;

    /// Execute `text` as one unit, returning every result set it produced in
    /// production order. `params` bind positional placeholders.
    fn execute(&mut self, text: &str, params: &[Value]) -> ConnectionResult<Vec<DataTable>>;

    /// True for driver-agnostic connections (ODBC-style), whose scripts live
    /// under a dedicated `odbc/` tree with a `default/` fallback.
    fn is_generic(&self) -> bool {
        false
    }
}
