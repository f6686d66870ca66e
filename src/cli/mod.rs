//! CLI module for dbscripts
//!
//! Provides command-line access to the scripting engine:
//! - resolve: Show the script directory chosen for a database
//! - list: List the object types scripted for a context
//! - exec: Run one script and print what it produced
//! - segments: Show the version segments of a script file

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{exec, list, resolve, run, run_command, segments, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_json;
