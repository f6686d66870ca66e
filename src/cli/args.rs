//! CLI argument definitions using clap
//!
//! Commands:
//! - dbscripts resolve --context <ctx> [--database <path>]
//! - dbscripts list --context <ctx> [--database <path>]
//! - dbscripts exec --context <ctx> --object <type> [--env ns.name=value ...]
//! - dbscripts segments --file <path> [--version <n>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::scripting::Context;

/// dbscripts - versioned database introspection scripts
#[derive(Parser, Debug)]
#[command(name = "dbscripts")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Scripts base directory, overrides the configuration file
    #[arg(long, global = true)]
    pub scripts_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the script directory resolved for a database
    Resolve {
        /// root, tree, content or preview
        #[arg(long)]
        context: Context,

        /// SQLite database file, overrides the configuration file
        #[arg(long)]
        database: Option<PathBuf>,
    },

    /// List the object types that have a script
    List {
        /// root, tree, content or preview
        #[arg(long)]
        context: Context,

        /// SQLite database file, overrides the configuration file
        #[arg(long)]
        database: Option<PathBuf>,
    },

    /// Execute the script of an object type and print its results
    Exec {
        /// root, tree, content or preview
        #[arg(long)]
        context: Context,

        /// Object type, i.e. the script's base name
        #[arg(long)]
        object: String,

        /// Environment value answering `$ns.name$` placeholders
        #[arg(long = "env", value_name = "NS.NAME=VALUE")]
        env: Vec<String>,

        /// SQLite database file, overrides the configuration file
        #[arg(long)]
        database: Option<PathBuf>,
    },

    /// Show the version segments of a script file
    Segments {
        /// Script file
        #[arg(long)]
        file: PathBuf,

        /// Comparable DBMS version to select a segment for
        #[arg(long = "version", allow_hyphen_values = true)]
        target: Option<i64>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
