//! Script resolution, versioning and execution
//!
//! Scripts live in a directory tree keyed by DBMS and UI context:
//!
//! ```text
//! <scripts_dir>/[odbc/]<dbms-or-default>/[tree|content|preview]/<objectType>.{sql|qs}
//! ```
//!
//! A request for an object type goes through these stages:
//!
//! 1. [`PathResolver`] finds the directory for the connection's DBMS
//! 2. [`ScriptStore`] scans it once and keeps the segment of every file
//!    valid for the DBMS version (see [`version`])
//! 3. [`expand_macros`] replaces `$ns.name$` placeholders from the caller's
//!    environment
//! 4. [`ScriptEngine`] runs the text as SQL or through a [`ScriptRuntime`]
//!    and collects the results in a [`Conductor`]
//!
//! # Usage
//!
//! ```ignore
//! use dbscripts::connection::{SqliteConnection, Value};
//! use dbscripts::scripting::{Context, EngineConfig, ScriptEngine};
//!
//! let engine = ScriptEngine::new(EngineConfig { scripts_dir: "scripts".into() });
//! let mut conn = SqliteConnection::file("app.db");
//! if let Some(conductor) = engine.execute(&mut conn, Context::Content, "tables", |_| Value::Null)? {
//!     println!("{} tables", conductor.tables().len());
//! }
//! ```

mod conductor;
mod context;
mod engine;
mod errors;
mod lua;
mod resolver;
mod runtime;
mod store;

pub mod macros;
pub mod version;

pub use conductor::{Conductor, EnvCallback, Output, HTML_COLUMN, SCRIPT_COLUMN};
pub use context::Context;
pub use engine::{EngineConfig, ScriptEngine, DEFAULT_SCRIPTS_DIR};
pub use errors::{ScriptingError, ScriptingResult};
pub use lua::LuaRuntime;
pub use macros::{expand_macros, placeholders, NULL_LITERAL};
pub use resolver::{DbmsIdentity, PathResolver, DEFAULT_DIR, GENERIC_DIR};
pub use runtime::{HostBindings, ScriptRuntime};
pub use store::{Script, ScriptBunch, ScriptKind, ScriptStore};
pub use version::{select, UNVERSIONED};
