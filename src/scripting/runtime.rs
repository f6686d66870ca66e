//! # Script Runtime
//!
//! Abstraction over the embeddable interpreter that evaluates `.qs`
//! scripts. The engine hands a runtime the program text and a
//! [`HostBindings`] implementation; the runtime exposes those bindings to
//! the script under fixed global names and evaluates the program in a
//! fresh scope.
//!
//! | Global | Binding |
//! |---|---|
//! | `connection` | handle with `execute(query, ...)`, `name`, `version` |
//! | `env(name)` | [`HostBindings::env`] |
//! | `exec(query, ...)` | [`HostBindings::exec`] |
//! | `returnTable(t)` | [`HostBindings::return_table`] |
//! | `returnScript(text)` | [`HostBindings::return_script`] |
//! | `returnHtml(text)` | [`HostBindings::return_html`] |

use super::errors::ScriptingResult;
use crate::connection::{ConnectionResult, DataTable, Value};

/// Host facilities visible to an interpreted script
pub trait HostBindings {
    /// DBMS product name of the connection
    fn dbms_name(&self) -> String;

    /// DBMS version string of the connection
    fn dbms_version(&self) -> String;

    /// Environment lookup (`env("schema.name")`)
    fn env(&self, name: &str) -> Value;

    /// Run a query on the connection, returning every result set produced
    fn exec(&self, query: &str, params: &[Value]) -> ConnectionResult<Vec<DataTable>>;

    /// Hand a table over to the execution's results
    fn return_table(&self, table: DataTable);

    /// Append follow-up script text to the execution's results
    fn return_script(&self, text: String);

    /// Append an HTML fragment to the execution's results
    fn return_html(&self, text: String);
}

/// An embeddable interpreter
pub trait ScriptRuntime: Send + Sync {
    /// Evaluate `program` with `host` bound into a fresh global scope.
    ///
    /// Evaluation errors are reported as `ScriptingError::Script` with the
    /// line number the interpreter reported; connection failures raised
    /// through `exec` come back as `ScriptingError::Connection`.
    fn evaluate(&self, name: &str, program: &str, host: &dyn HostBindings) -> ScriptingResult<()>;

    /// Runtime name for logging
    fn name(&self) -> &'static str;
}
