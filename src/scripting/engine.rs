//! # Execution Engine
//!
//! Looks up the script registered for an object type, expands its macros
//! against the caller's environment and runs it in the mode its kind
//! dictates. Everything the run produced is collected in a [`Conductor`].
//!
//! ## SQL scripts
//!
//! The expanded text is sent to the connection as one unit. Result sets
//! are visited in reverse production order and each one is classified
//! once (see [`Output::classify`]).
//!
//! ## Interpreted scripts
//!
//! The expanded text is evaluated by the engine's [`ScriptRuntime`] with
//! host bindings forwarding to the connection and the conductor.

use std::cell::RefCell;
use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::conductor::{Conductor, Output};
use super::context::Context;
use super::errors::ScriptingResult;
use super::lua::LuaRuntime;
use super::macros::expand_macros;
use super::resolver::PathResolver;
use super::runtime::{HostBindings, ScriptRuntime};
use super::store::{ScriptKind, ScriptStore};
use crate::connection::{Connection, ConnectionResult, DataTable, Value};
use crate::observability::Event;

/// Directory name looked up next to the executable when no scripts
/// directory is configured
pub const DEFAULT_SCRIPTS_DIR: &str = "scripts";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base directory of the script tree
    pub scripts_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let base = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(PathBuf::from))
            .unwrap_or_default();
        Self {
            scripts_dir: base.join(DEFAULT_SCRIPTS_DIR),
        }
    }
}

/// Script execution service
pub struct ScriptEngine {
    store: ScriptStore,
    runtime: Box<dyn ScriptRuntime>,
}

impl ScriptEngine {
    /// Engine evaluating interpreted scripts with Lua
    pub fn new(config: EngineConfig) -> Self {
        Self::with_runtime(config, Box::new(LuaRuntime::new()))
    }

    pub fn with_runtime(config: EngineConfig, runtime: Box<dyn ScriptRuntime>) -> Self {
        Self {
            store: ScriptStore::new(PathResolver::new(config.scripts_dir)),
            runtime,
        }
    }

    pub fn store(&self) -> &ScriptStore {
        &self.store
    }

    /// Rescan the scripts of `context`
    pub fn refresh(&self, connection: &mut dyn Connection, context: Context) -> ScriptingResult<()> {
        self.store.refresh(connection, context)
    }

    /// Run the script registered for `object_type`.
    ///
    /// Returns `Ok(None)` when no script exists for it. `env` answers macro
    /// placeholders and `env()` calls made by interpreted scripts.
    pub fn execute<'env>(
        &self,
        connection: &mut dyn Connection,
        context: Context,
        object_type: &str,
        env: impl Fn(&str) -> Value + 'env,
    ) -> ScriptingResult<Option<Conductor<'env>>> {
        let Some(script) = self.store.get_script(connection, context, object_type)? else {
            info!(
                event = %Event::ScriptMissing,
                context = %context,
                object_type,
                "no script registered"
            );
            return Ok(None);
        };

        let execution_id = Uuid::new_v4();
        info!(
            event = %Event::ExecutionStart,
            execution_id = %execution_id,
            context = %context,
            object_type,
            kind = script.kind.as_str(),
            "executing script"
        );

        let mut conductor = Conductor::new(env);
        let text = expand_macros(&script.body, |name| conductor.value(name));

        let outcome = match script.kind {
            ScriptKind::Sql => run_sql(connection, &text, &mut conductor).map(|()| conductor),
            ScriptKind::Interpreted => {
                self.run_interpreted(connection, object_type, &text, conductor)
            }
        };
        let conductor = match outcome {
            Ok(conductor) => conductor,
            Err(e) => {
                warn!(
                    event = %Event::ExecutionFailed,
                    execution_id = %execution_id,
                    object_type,
                    code = e.code(),
                    error = %e,
                    "script execution failed"
                );
                return Err(e);
            }
        };

        info!(
            event = %Event::ExecutionComplete,
            execution_id = %execution_id,
            object_type,
            tables = conductor.tables().len(),
            scripts = conductor.scripts().len(),
            html = conductor.html().len(),
            "script executed"
        );
        Ok(Some(conductor))
    }

    fn run_interpreted<'env>(
        &self,
        connection: &mut dyn Connection,
        object_type: &str,
        program: &str,
        conductor: Conductor<'env>,
    ) -> ScriptingResult<Conductor<'env>> {
        let host = ExecutionHost {
            connection: RefCell::new(connection),
            conductor: RefCell::new(conductor),
        };
        self.runtime.evaluate(object_type, program, &host)?;
        Ok(host.conductor.into_inner())
    }
}

impl std::fmt::Debug for ScriptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptEngine")
            .field("store", &self.store)
            .field("runtime", &self.runtime.name())
            .finish()
    }
}

fn run_sql(
    connection: &mut dyn Connection,
    text: &str,
    conductor: &mut Conductor<'_>,
) -> ScriptingResult<()> {
    let tables = connection.execute(text, &[])?;
    for table in tables.into_iter().rev() {
        conductor.accept(Output::classify(table));
    }
    Ok(())
}

/// Bindings handed to the runtime for one interpreted execution
struct ExecutionHost<'a, 'env> {
    connection: RefCell<&'a mut dyn Connection>,
    conductor: RefCell<Conductor<'env>>,
}

impl HostBindings for ExecutionHost<'_, '_> {
    fn dbms_name(&self) -> String {
        self.connection.borrow().dbms_name()
    }

    fn dbms_version(&self) -> String {
        self.connection.borrow().dbms_version()
    }

    fn env(&self, name: &str) -> Value {
        self.conductor.borrow().value(name)
    }

    fn exec(&self, query: &str, params: &[Value]) -> ConnectionResult<Vec<DataTable>> {
        self.connection.borrow_mut().execute(query, params)
    }

    fn return_table(&self, table: DataTable) {
        self.conductor.borrow_mut().append_table(table);
    }

    fn return_script(&self, text: String) {
        self.conductor.borrow_mut().append_script(text);
    }

    fn return_html(&self, text: String) {
        self.conductor.borrow_mut().append_html(text);
    }
}
