//! Shared fixtures for integration tests
//!
//! - `FakeConnection`: scripted `Connection` with canned result sets
//! - `ScriptTree`: temporary scripts directory builder

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use dbscripts::connection::{Connection, ConnectionError, ConnectionResult, DataTable, Value};
use tempfile::TempDir;

// =============================================================================
// Fake Connection
// =============================================================================

/// Connection answering every query with the same result sets
pub struct FakeConnection {
    pub name: String,
    pub version: String,
    pub comparable_version: i64,
    pub generic: bool,
    pub results: Vec<DataTable>,
    pub failure: Option<ConnectionError>,
    pub executed: Vec<(String, Vec<Value>)>,
    pub opens: usize,
}

impl FakeConnection {
    pub fn new(name: &str, version: &str, comparable_version: i64) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            comparable_version,
            generic: false,
            results: Vec::new(),
            failure: None,
            executed: Vec::new(),
            opens: 0,
        }
    }

    pub fn postgres() -> Self {
        Self::new("PostgreSQL", "16.2", 160002)
    }

    pub fn generic(mut self) -> Self {
        self.generic = true;
        self
    }

    pub fn returning(mut self, results: Vec<DataTable>) -> Self {
        self.results = results;
        self
    }

    pub fn failing(mut self, err: ConnectionError) -> Self {
        self.failure = Some(err);
        self
    }

    pub fn queries(&self) -> Vec<&str> {
        self.executed.iter().map(|(q, _)| q.as_str()).collect()
    }
}

impl Connection for FakeConnection {
    fn open(&mut self) -> ConnectionResult<()> {
        self.opens += 1;
        Ok(())
    }

    fn dbms_name(&self) -> String {
        self.name.clone()
    }

    fn dbms_version(&self) -> String {
        self.version.clone()
    }

    fn dbms_comparable_version(&mut self) -> ConnectionResult<i64> {
        Ok(self.comparable_version)
    }

    fn execute(&mut self, text: &str, params: &[Value]) -> ConnectionResult<Vec<DataTable>> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        self.executed.push((text.to_string(), params.to_vec()));
        Ok(self.results.clone())
    }

    fn is_generic(&self) -> bool {
        self.generic
    }
}

// =============================================================================
// Script Tree
// =============================================================================

/// Temporary scripts directory, removed on drop
pub struct ScriptTree {
    tmp: TempDir,
}

impl ScriptTree {
    pub fn new() -> Self {
        Self {
            tmp: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// Create a directory (and parents) relative to the root
    pub fn dir(&self, rel: &str) -> PathBuf {
        let path = self.tmp.path().join(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Write a script file relative to the root, creating parents
    pub fn file(&self, rel: &str, body: &str) -> PathBuf {
        let path = self.tmp.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        path
    }
}

/// One-column, one-row table
pub fn cell(column: &str, value: &str) -> DataTable {
    DataTable::new([column]).with_row(vec![value.into()])
}
