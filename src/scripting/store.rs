//! # Script Store
//!
//! Per-directory cache of parsed scripts. A directory is scanned the first
//! time a script is requested from it and then served from memory; file
//! changes are only picked up by an explicit [`ScriptStore::refresh`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use super::context::Context;
use super::errors::{ScriptingError, ScriptingResult};
use super::resolver::PathResolver;
use super::version::{self, UNVERSIONED};
use crate::connection::Connection;
use crate::observability::Event;

/// How a script is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    /// Sent to the connection as-is (`.sql`)
    Sql,
    /// Evaluated by the embedded runtime (`.qs`)
    Interpreted,
}

impl ScriptKind {
    /// Kind for a file extension, `None` for files that are not scripts
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "sql" => Some(ScriptKind::Sql),
            "qs" => Some(ScriptKind::Interpreted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptKind::Sql => "sql",
            ScriptKind::Interpreted => "qs",
        }
    }
}

/// A version-resolved script body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub body: String,
    pub kind: ScriptKind,
}

/// Scripts of one directory, by object type
pub type ScriptBunch = HashMap<String, Arc<Script>>;

/// Load state of one directory
#[derive(Debug, Clone)]
enum BunchState {
    NotLoaded,
    Loaded(Arc<ScriptBunch>),
}

/// Script cache keyed by resolved directory
#[derive(Debug)]
pub struct ScriptStore {
    resolver: PathResolver,
    bunches: RwLock<HashMap<PathBuf, BunchState>>,
}

impl ScriptStore {
    pub fn new(resolver: PathResolver) -> Self {
        Self {
            resolver,
            bunches: RwLock::new(HashMap::new()),
        }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Rescan the directory for `context`, replacing whatever was cached.
    ///
    /// On failure the directory is left unloaded so the next lookup scans
    /// again.
    pub fn refresh(&self, connection: &mut dyn Connection, context: Context) -> ScriptingResult<()> {
        let path = self.resolver.resolve(connection, context)?;
        self.set_state(&path, BunchState::NotLoaded)?;

        let target = if context == Context::Root {
            UNVERSIONED
        } else {
            connection.dbms_comparable_version()?
        };

        let bunch = scan_dir(&path, target)?;
        info!(
            event = %Event::ScriptDirScanned,
            path = %path.display(),
            scripts = bunch.len(),
            version = target,
            "scanned script directory"
        );
        self.set_state(&path, BunchState::Loaded(Arc::new(bunch)))
    }

    /// Script registered for `object_type`, scanning the directory on first use
    pub fn get_script(
        &self,
        connection: &mut dyn Connection,
        context: Context,
        object_type: &str,
    ) -> ScriptingResult<Option<Arc<Script>>> {
        let bunch = self.loaded_bunch(connection, context)?;
        Ok(bunch.get(object_type).cloned())
    }

    /// Registered object types with their kinds, sorted by name
    pub fn object_types(
        &self,
        connection: &mut dyn Connection,
        context: Context,
    ) -> ScriptingResult<Vec<(String, ScriptKind)>> {
        let bunch = self.loaded_bunch(connection, context)?;
        let mut types: Vec<_> = bunch.iter().map(|(name, s)| (name.clone(), s.kind)).collect();
        types.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(types)
    }

    /// Forget every scanned directory
    pub fn clear(&self) -> ScriptingResult<()> {
        let mut bunches = self.bunches.write().map_err(|_| ScriptingError::lock_poisoned())?;
        bunches.clear();
        Ok(())
    }

    fn loaded_bunch(
        &self,
        connection: &mut dyn Connection,
        context: Context,
    ) -> ScriptingResult<Arc<ScriptBunch>> {
        let path = self.resolver.resolve(connection, context)?;
        if let Some(bunch) = self.cached(&path)? {
            return Ok(bunch);
        }

        self.refresh(connection, context)?;
        Ok(self.cached(&path)?.unwrap_or_default())
    }

    fn cached(&self, path: &Path) -> ScriptingResult<Option<Arc<ScriptBunch>>> {
        let bunches = self.bunches.read().map_err(|_| ScriptingError::lock_poisoned())?;
        Ok(match bunches.get(path) {
            Some(BunchState::Loaded(bunch)) => Some(Arc::clone(bunch)),
            _ => None,
        })
    }

    fn set_state(&self, path: &Path, state: BunchState) -> ScriptingResult<()> {
        let mut bunches = self.bunches.write().map_err(|_| ScriptingError::lock_poisoned())?;
        bunches.insert(path.to_path_buf(), state);
        Ok(())
    }
}

/// Read every script file in `dir`, keeping the part valid for `version`
fn scan_dir(dir: &Path, version: i64) -> ScriptingResult<ScriptBunch> {
    let entries = fs::read_dir(dir).map_err(|e| ScriptingError::io(dir, e))?;
    let mut bunch = ScriptBunch::new();

    for entry in entries {
        let entry = entry.map_err(|e| ScriptingError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(kind) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ScriptKind::from_extension)
        else {
            continue;
        };
        let Some(object_type) = object_type_of(&path) else {
            continue;
        };

        let content = fs::read_to_string(&path).map_err(|e| ScriptingError::io(&path, e))?;
        debug!(file = %path.display(), kind = kind.as_str(), "loaded script");
        bunch.insert(
            object_type,
            Arc::new(Script {
                body: version::select(&content, version),
                kind,
            }),
        );
    }

    Ok(bunch)
}

/// File name up to the first dot: `columns.v2.sql` registers `columns`
fn object_type_of(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let base = name.split('.').next().unwrap_or(name);
    (!base.is_empty()).then(|| base.to_string())
}
