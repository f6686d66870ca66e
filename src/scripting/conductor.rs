//! # Conductor
//!
//! Collects everything one script execution produced: result tables,
//! follow-up script text and HTML fragments. The conductor owns its tables;
//! dropping it (or calling [`Conductor::clear`]) releases them.

use std::fmt;

use crate::connection::{DataTable, Value};

/// Column name routing a 1x1 result into the follow-up script sequence
pub const SCRIPT_COLUMN: &str = "script";

/// Column name routing a 1x1 result into the HTML sequence
pub const HTML_COLUMN: &str = "html";

/// Where one produced result set ends up
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Table(DataTable),
    Script(String),
    Html(String),
}

impl Output {
    /// Classify a result set. Consumes it: a 1x1 `script`/`html` result is
    /// reduced to its text, anything else is kept as a table.
    pub fn classify(table: DataTable) -> Self {
        let routed = table.row_count() == 1
            && table.column_count() == 1
            && table
                .column(0)
                .is_some_and(|c| c.name == SCRIPT_COLUMN || c.name == HTML_COLUMN);
        if !routed {
            return Output::Table(table);
        }

        match table.into_single_cell() {
            Ok((name, value)) if name == SCRIPT_COLUMN => Output::Script(value.to_text()),
            Ok((_, value)) => Output::Html(value.to_text()),
            Err(table) => Output::Table(table),
        }
    }
}

/// Environment lookup supplied by the caller of an execution
pub type EnvCallback<'env> = dyn Fn(&str) -> Value + 'env;

/// Aggregated output of one execution
pub struct Conductor<'env> {
    env: Box<EnvCallback<'env>>,
    tables: Vec<DataTable>,
    scripts: Vec<String>,
    html: Vec<String>,
}

impl<'env> Conductor<'env> {
    pub fn new(env: impl Fn(&str) -> Value + 'env) -> Self {
        Self {
            env: Box::new(env),
            tables: Vec::new(),
            scripts: Vec::new(),
            html: Vec::new(),
        }
    }

    /// Look up an environment value through the caller's callback
    pub fn value(&self, name: &str) -> Value {
        (self.env)(name)
    }

    pub fn append_table(&mut self, table: DataTable) {
        self.tables.push(table);
    }

    pub fn append_script(&mut self, script: impl Into<String>) {
        self.scripts.push(script.into());
    }

    pub fn append_html(&mut self, html: impl Into<String>) {
        self.html.push(html.into());
    }

    /// Store a classified result
    pub fn accept(&mut self, output: Output) {
        match output {
            Output::Table(table) => self.append_table(table),
            Output::Script(text) => self.append_script(text),
            Output::Html(text) => self.append_html(text),
        }
    }

    /// Release every owned table and drop collected text
    pub fn clear(&mut self) {
        self.tables.clear();
        self.scripts.clear();
        self.html.clear();
    }

    pub fn tables(&self) -> &[DataTable] {
        &self.tables
    }

    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    pub fn html(&self) -> &[String] {
        &self.html
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.scripts.is_empty() && self.html.is_empty()
    }

    /// Take ownership of everything collected
    pub fn into_parts(self) -> (Vec<DataTable>, Vec<String>, Vec<String>) {
        (self.tables, self.scripts, self.html)
    }
}

impl fmt::Debug for Conductor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conductor")
            .field("tables", &self.tables.len())
            .field("scripts", &self.scripts)
            .field("html", &self.html)
            .finish_non_exhaustive()
    }
}
