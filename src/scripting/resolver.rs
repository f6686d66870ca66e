//! # Script Path Resolution
//!
//! Maps a connection to the directory holding its DBMS's scripts:
//!
//! ```text
//! <scripts_dir>/[odbc/]<dbms-or-default>/[tree|content|preview]/
//! ```
//!
//! The DBMS root is searched once per [`DbmsIdentity`] and cached for the
//! lifetime of the resolver; the context suffix is appended on every call.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, info};

use super::context::Context;
use super::errors::{ScriptingError, ScriptingResult};
use crate::connection::Connection;
use crate::observability::Event;

/// Subdirectory holding scripts for driver-agnostic connections
pub const GENERIC_DIR: &str = "odbc";

/// Fallback DBMS directory for driver-agnostic connections
pub const DEFAULT_DIR: &str = "default";

/// Cache key derived from DBMS product name and version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbmsIdentity(String);

impl DbmsIdentity {
    pub fn new(name: &str, version: &str) -> Self {
        Self(format!("{}{}", name, version))
    }

    pub fn of(connection: &dyn Connection) -> Self {
        Self::new(&connection.dbms_name(), &connection.dbms_version())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DbmsIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves script directories and caches DBMS roots
#[derive(Debug)]
pub struct PathResolver {
    scripts_dir: PathBuf,
    roots: RwLock<HashMap<DbmsIdentity, PathBuf>>,
}

impl PathResolver {
    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            roots: RwLock::new(HashMap::new()),
        }
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    /// Directory holding `context` scripts for `connection`'s DBMS
    pub fn resolve(
        &self,
        connection: &mut dyn Connection,
        context: Context,
    ) -> ScriptingResult<PathBuf> {
        connection.open()?;
        let identity = DbmsIdentity::of(connection);

        if let Some(root) = self.cached_root(&identity)? {
            return context_dir(&root, context);
        }

        let generic = connection.is_generic();
        let mut base = self.scripts_dir.clone();
        if generic {
            base.push(GENERIC_DIR);
        }
        if !base.is_dir() {
            return Err(ScriptingError::configuration(format!(
                "directory {} does not exist",
                base.display()
            )));
        }

        let dbms_name = connection.dbms_name();
        if dbms_name.is_empty() {
            return Err(ScriptingError::configuration("unable to get dbms name"));
        }

        let root = match find_dbms_dir(&base, &dbms_name)? {
            Some(dir) => base.join(dir),
            None if generic => base.join(DEFAULT_DIR),
            None => base,
        };

        context_dir(&root, context)?;

        let root = {
            let mut roots = self.roots.write().map_err(|_| ScriptingError::lock_poisoned())?;
            roots.entry(identity.clone()).or_insert(root).clone()
        };
        info!(
            event = %Event::ScriptRootResolved,
            dbms = %identity,
            root = %root.display(),
            "resolved script root"
        );

        context_dir(&root, context)
    }

    /// Cached DBMS root for `identity`, if it was resolved before
    pub fn cached_root(&self, identity: &DbmsIdentity) -> ScriptingResult<Option<PathBuf>> {
        let roots = self.roots.read().map_err(|_| ScriptingError::lock_poisoned())?;
        Ok(roots.get(identity).cloned())
    }

    /// Forget every cached root
    pub fn clear(&self) -> ScriptingResult<()> {
        let mut roots = self.roots.write().map_err(|_| ScriptingError::lock_poisoned())?;
        roots.clear();
        Ok(())
    }
}

/// `context` directory under a DBMS root, which must exist
fn context_dir(root: &Path, context: Context) -> ScriptingResult<PathBuf> {
    let path = root.join(context.subdir());
    if !path.is_dir() {
        return Err(ScriptingError::configuration(format!(
            "directory {} is not available",
            path.display()
        )));
    }
    Ok(path)
}

/// Subdirectory of `base` whose name occurs in `dbms_name`, ignoring case.
///
/// The longest matching name wins so that `sql server` beats `sql`; equal
/// lengths fall back to name order.
fn find_dbms_dir(base: &Path, dbms_name: &str) -> ScriptingResult<Option<String>> {
    let wanted = dbms_name.to_lowercase();
    let entries = fs::read_dir(base).map_err(|e| ScriptingError::io(base, e))?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ScriptingError::io(base, e))?;
        if !entry.path().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !name.is_empty() && wanted.contains(&name.to_lowercase()) {
            candidates.push(name);
        }
    }

    candidates.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    debug!(dbms = dbms_name, candidates = ?candidates, "dbms script directory candidates");
    Ok(candidates.into_iter().next())
}
