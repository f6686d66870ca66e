//! CLI command implementations
//!
//! Each command builds its own engine from the configuration, runs against
//! the configured SQLite database and returns a single JSON document.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as Json};
use tracing::info;

use crate::connection::{DataTable, SqliteConnection, Value};
use crate::observability::{self, Event, LogFormat};
use crate::scripting::{self, Context, DbmsIdentity, EngineConfig, ScriptEngine, ScriptingError};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::write_json;

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scripts base directory (optional, default `<exe dir>/scripts`)
    #[serde(default)]
    pub scripts_dir: Option<PathBuf>,

    /// SQLite database file (optional, required by every command but `segments`)
    #[serde(default)]
    pub database: Option<PathBuf>,

    /// Log filter directive (optional, default "warn")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log line format: "text" or "json" (optional, default "text")
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Defaults used when no configuration file is given
    pub fn defaults() -> Self {
        Self {
            log_level: default_log_level(),
            ..Self::default()
        }
    }

    fn validate(&self) -> CliResult<()> {
        observability::parse_filter(&self.log_level)?;

        if let Some(dir) = &self.scripts_dir {
            if dir.as_os_str().is_empty() {
                return Err(CliError::config_error("scripts_dir must not be empty"));
            }
        }

        Ok(())
    }

    /// Engine configuration derived from this file
    pub fn engine_config(&self) -> EngineConfig {
        match &self.scripts_dir {
            Some(dir) => EngineConfig {
                scripts_dir: dir.clone(),
            },
            None => EngineConfig::default(),
        }
    }

    /// Connection to the configured database, or the override
    fn connection(&self, database: Option<PathBuf>) -> CliResult<SqliteConnection> {
        let path = database
            .or_else(|| self.database.clone())
            .ok_or_else(|| ScriptingError::configuration("no database configured"))?;
        Ok(SqliteConnection::file(path))
    }
}

/// Main CLI entry point
///
/// Parses arguments, loads configuration, installs logging and dispatches
/// to the appropriate command. This is the only function `main` calls.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::defaults(),
    };
    if let Some(dir) = cli.scripts_dir {
        config.scripts_dir = Some(dir);
    }

    // A second installation fails harmlessly, the first subscriber stays
    let _ = observability::init_logging(&config.log_level, config.log_format);
    info!(
        event = %Event::ConfigLoaded,
        scripts_dir = ?config.scripts_dir,
        database = ?config.database,
        "configuration loaded"
    );

    let output = run_command(&config, cli.command)?;
    write_json(&output)
}

/// Run the appropriate command, returning its JSON output
pub fn run_command(config: &Config, cmd: Command) -> CliResult<Json> {
    match cmd {
        Command::Resolve { context, database } => resolve(config, context, database),
        Command::List { context, database } => list(config, context, database),
        Command::Exec {
            context,
            object,
            env,
            database,
        } => exec(config, context, &object, &env, database),
        Command::Segments { file, target } => segments(&file, target),
    }
}

/// Directory the engine would read `context` scripts from
pub fn resolve(config: &Config, context: Context, database: Option<PathBuf>) -> CliResult<Json> {
    let mut conn = config.connection(database)?;
    let engine = ScriptEngine::new(config.engine_config());
    let path = engine.store().resolver().resolve(&mut conn, context)?;

    Ok(json!({
        "context": context,
        "dbms": DbmsIdentity::of(&conn).as_str(),
        "path": path.display().to_string(),
    }))
}

/// Object types scripted for `context`
pub fn list(config: &Config, context: Context, database: Option<PathBuf>) -> CliResult<Json> {
    let mut conn = config.connection(database)?;
    let engine = ScriptEngine::new(config.engine_config());
    let types = engine.store().object_types(&mut conn, context)?;

    let scripts: Vec<Json> = types
        .into_iter()
        .map(|(name, kind)| json!({ "object_type": name, "kind": kind.as_str() }))
        .collect();
    Ok(json!({ "context": context, "scripts": scripts }))
}

/// Run the script of `object` and report everything it produced
pub fn exec(
    config: &Config,
    context: Context,
    object: &str,
    env: &[String],
    database: Option<PathBuf>,
) -> CliResult<Json> {
    let env = parse_env(env)?;
    let mut conn = config.connection(database)?;
    let engine = ScriptEngine::new(config.engine_config());

    let conductor = engine.execute(&mut conn, context, object, |name| {
        env.get(name).cloned().unwrap_or_default()
    })?;
    let Some(conductor) = conductor else {
        return Ok(json!({ "status": "no_script", "object_type": object }));
    };

    let (tables, scripts, html) = conductor.into_parts();
    Ok(json!({
        "status": "ok",
        "object_type": object,
        "tables": tables.iter().map(table_json).collect::<Vec<_>>(),
        "scripts": scripts,
        "html": html,
    }))
}

/// Version partition of a script file, plus the selected part for `target`
pub fn segments(file: &Path, target: Option<i64>) -> CliResult<Json> {
    let body = fs::read_to_string(file)
        .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", file.display(), e)))?;

    let parts: Vec<Json> = scripting::version::segments(&body)
        .into_iter()
        .map(|(version, text)| json!({ "version": version, "text": text }))
        .collect();

    let mut output = json!({
        "file": file.display().to_string(),
        "segments": parts,
    });
    if let Some(target) = target {
        output["version"] = json!(target);
        output["selected"] = json!(scripting::select(&body, target));
    }
    Ok(output)
}

/// Parse `ns.name=value` pairs into an environment map
fn parse_env(pairs: &[String]) -> CliResult<HashMap<String, Value>> {
    pairs
        .iter()
        .map(|pair| {
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                CliError::invalid_argument(format!("Expected NS.NAME=VALUE, got '{}'", pair))
            })?;
            let well_formed = name
                .split_once('.')
                .is_some_and(|(ns, key)| !ns.is_empty() && !key.is_empty() && !key.contains('.'));
            if !well_formed {
                return Err(CliError::invalid_argument(format!(
                    "Environment name '{}' must look like namespace.name",
                    name
                )));
            }
            Ok((name.to_string(), Value::from(value)))
        })
        .collect()
}

fn table_json(table: &DataTable) -> Json {
    let columns: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
    json!({
        "columns": columns,
        "rows": table.rows(),
    })
}
