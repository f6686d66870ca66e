//! # SQLite Connection
//!
//! `Connection` implementation over bundled SQLite. Scripts may contain
//! several statements; each statement that returns columns produces one
//! result set.

use std::path::{Path, PathBuf};

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::Batch;
use tracing::debug;

use super::table::{DataTable, Value};
use super::{Connection, ConnectionError, ConnectionResult};

/// Where the database lives
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    File(PathBuf),
    Memory,
}

/// SQLite-backed connection, opened lazily
pub struct SqliteConnection {
    target: Target,
    conn: Option<rusqlite::Connection>,
}

impl SqliteConnection {
    /// Connection to a database file (created on open if missing)
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            target: Target::File(path.as_ref().to_path_buf()),
            conn: None,
        }
    }

    /// Private in-memory database
    pub fn memory() -> Self {
        Self {
            target: Target::Memory,
            conn: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn handle(&mut self) -> ConnectionResult<&rusqlite::Connection> {
        self.open()?;
        self.conn
            .as_ref()
            .ok_or_else(|| ConnectionError::Open("connection not available".into()))
    }
}

impl Connection for SqliteConnection {
    fn open(&mut self) -> ConnectionResult<()> {
        if self.is_open() {
            return Ok(());
        }
        let conn = match &self.target {
            Target::File(path) => rusqlite::Connection::open(path),
            Target::Memory => rusqlite::Connection::open_in_memory(),
        }
        .map_err(|e| ConnectionError::Open(e.to_string()))?;
        debug!(database = ?self.target, "sqlite connection opened");
        self.conn = Some(conn);
        Ok(())
    }

    fn dbms_name(&self) -> String {
        "SQLite".to_string()
    }

    fn dbms_version(&self) -> String {
        rusqlite::version().to_string()
    }

    fn dbms_comparable_version(&mut self) -> ConnectionResult<i64> {
        Ok(i64::from(rusqlite::version_number()))
    }

    fn execute(&mut self, text: &str, params: &[Value]) -> ConnectionResult<Vec<DataTable>> {
        let conn = self.handle()?;
        let mut results = Vec::new();
        let mut batch = Batch::new(conn, text);

        while let Some(mut stmt) = batch.next().map_err(query_error)? {
            let wanted = stmt.parameter_count();
            for (i, param) in params.iter().take(wanted).enumerate() {
                stmt.raw_bind_parameter(i + 1, to_sql(param))
                    .map_err(query_error)?;
            }

            let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            if names.is_empty() {
                stmt.raw_execute().map_err(query_error)?;
                continue;
            }

            let width = names.len();
            let mut table = DataTable::new(names);
            let mut rows = stmt.raw_query();
            while let Some(row) = rows.next().map_err(query_error)? {
                let mut cells = Vec::with_capacity(width);
                for i in 0..width {
                    cells.push(from_sql(row.get_ref(i).map_err(query_error)?));
                }
                table.push_row(cells);
            }
            results.push(table);
        }

        Ok(results)
    }
}

fn query_error(e: rusqlite::Error) -> ConnectionError {
    ConnectionError::Query(e.to_string())
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Text(format!("<{} bytes>", b.len())),
    }
}
