//! # Lua Runtime
//!
//! [`ScriptRuntime`] backed by an embedded Lua 5.4 interpreter. Every
//! evaluation gets its own `Lua` state; host bindings are scoped to the
//! evaluation and cannot outlive it.
//!
//! Result sets returned by `exec` are userdata handles with `rowCount()`,
//! `columnCount()`, `columnName(i)` and `value(row, col)` (0-based).
//! Passing a handle to `returnTable` moves the table into the execution
//! results; the handle is unusable afterwards.
//!
//! `connection.execute` accepts both `connection.execute(q, ...)` and
//! `connection:execute(q, ...)`.

use std::sync::OnceLock;

use mlua::{AnyUserData, Lua, UserData, UserDataMethods, Value as LuaValue, Variadic};
use regex::Regex;
use tracing::debug;

use super::errors::{ScriptingError, ScriptingResult};
use super::runtime::{HostBindings, ScriptRuntime};
use crate::connection::{ConnectionError, DataTable, Value};

/// Lua-backed script runtime
#[derive(Debug, Default, Clone, Copy)]
pub struct LuaRuntime;

impl LuaRuntime {
    pub fn new() -> Self {
        Self
    }
}

/// Result set handle exposed to scripts
struct ResultSet(DataTable);

impl UserData for ResultSet {
    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_method("rowCount", |_, this, ()| Ok(this.0.row_count()));
        methods.add_method("columnCount", |_, this, ()| Ok(this.0.column_count()));
        methods.add_method("columnName", |_, this, index: usize| {
            Ok(this.0.column(index).map(|c| c.name.clone()))
        });
        methods.add_method("value", |lua, this, (row, column): (usize, usize)| {
            match this.0.value(row, column) {
                Some(value) => to_lua(lua, value),
                None => Ok(LuaValue::Nil),
            }
        });
    }
}

impl ScriptRuntime for LuaRuntime {
    fn evaluate(&self, name: &str, program: &str, host: &dyn HostBindings) -> ScriptingResult<()> {
        let lua = Lua::new();

        let result = lua.scope(|scope| {
            let globals = lua.globals();

            let env = scope.create_function(|lua, key: String| to_lua(lua, &host.env(&key)))?;
            globals.set("env", env)?;

            let exec = scope.create_function(
                |lua, (query, args): (String, Variadic<LuaValue>)| {
                    run_query(lua, host, &query, args)
                },
            )?;
            globals.set("exec", exec)?;

            // Method calls pass the connection table first
            let execute = scope.create_function(|lua, args: Variadic<LuaValue>| {
                let mut args = args.into_iter().peekable();
                if matches!(args.peek(), Some(LuaValue::Table(_))) {
                    args.next();
                }
                let query = match args.next() {
                    Some(LuaValue::String(s)) => s.to_str()?.to_string(),
                    other => {
                        return Err(mlua::Error::RuntimeError(format!(
                            "connection.execute expects a query string, got {}",
                            other.map_or("no value", |v| v.type_name())
                        )))
                    }
                };
                run_query(lua, host, &query, args)
            })?;

            let connection = lua.create_table()?;
            connection.set("execute", execute)?;
            connection.set("name", host.dbms_name())?;
            connection.set("version", host.dbms_version())?;
            globals.set("connection", connection)?;

            let return_table = scope.create_function(|_, handle: AnyUserData| {
                let ResultSet(table) = handle.take::<ResultSet>()?;
                host.return_table(table);
                Ok(())
            })?;
            globals.set("returnTable", return_table)?;

            let return_script = scope.create_function(|_, text: String| {
                host.return_script(text);
                Ok(())
            })?;
            globals.set("returnScript", return_script)?;

            let return_html = scope.create_function(|_, text: String| {
                host.return_html(text);
                Ok(())
            })?;
            globals.set("returnHtml", return_html)?;

            lua.load(program).set_name(name).exec()
        });

        result.map_err(|e| {
            debug!(script = name, error = %e, "lua evaluation failed");
            to_scripting_error(e)
        })
    }

    fn name(&self) -> &'static str {
        "lua"
    }
}

/// Run `query` on the host and wrap every result set in a handle
fn run_query<'lua>(
    lua: &'lua Lua,
    host: &dyn HostBindings,
    query: &str,
    args: impl IntoIterator<Item = LuaValue<'lua>>,
) -> mlua::Result<Variadic<AnyUserData<'lua>>> {
    let params = args
        .into_iter()
        .map(from_lua)
        .collect::<mlua::Result<Vec<_>>>()?;
    let tables = host.exec(query, &params).map_err(mlua::Error::external)?;
    tables
        .into_iter()
        .map(|t| lua.create_userdata(ResultSet(t)))
        .collect()
}

fn to_lua<'lua>(lua: &'lua Lua, value: &Value) -> mlua::Result<LuaValue<'lua>> {
    Ok(match value {
        Value::Null => LuaValue::Nil,
        Value::Bool(b) => LuaValue::Boolean(*b),
        Value::Int(i) => LuaValue::Integer(*i),
        Value::Float(f) => LuaValue::Number(*f),
        Value::Text(s) => LuaValue::String(lua.create_string(s)?),
    })
}

fn from_lua(value: LuaValue<'_>) -> mlua::Result<Value> {
    match value {
        LuaValue::Nil => Ok(Value::Null),
        LuaValue::Boolean(b) => Ok(Value::Bool(b)),
        LuaValue::Integer(i) => Ok(Value::Int(i)),
        LuaValue::Number(f) => Ok(Value::Float(f)),
        LuaValue::String(s) => Ok(Value::Text(s.to_str()?.to_string())),
        other => Err(mlua::Error::RuntimeError(format!(
            "unsupported query parameter of type {}",
            other.type_name()
        ))),
    }
}

/// Connection failures keep their identity; everything else becomes a
/// script error carrying the line Lua reported.
fn to_scripting_error(err: mlua::Error) -> ScriptingError {
    if let Some(conn) = connection_cause(&err) {
        return ScriptingError::Connection(conn);
    }
    let message = err.to_string();
    ScriptingError::script(line_number(&message).unwrap_or(0), message)
}

fn connection_cause(err: &mlua::Error) -> Option<ConnectionError> {
    match err {
        mlua::Error::CallbackError { cause, .. } => connection_cause(cause),
        mlua::Error::ExternalError(inner) => inner.downcast_ref::<ConnectionError>().cloned(),
        _ => None,
    }
}

/// Line number from a Lua location prefix such as `[string "tables"]:12:`
fn line_number(message: &str) -> Option<u32> {
    static LOCATION: OnceLock<Regex> = OnceLock::new();
    let re = LOCATION.get_or_init(|| Regex::new(r#"\]:(\d+):"#).expect("valid location regex"));
    re.captures(message)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Host recording everything a script hands back
    #[derive(Default)]
    struct RecordingHost {
        queries: RefCell<Vec<(String, Vec<Value>)>>,
        tables: RefCell<Vec<DataTable>>,
        scripts: RefCell<Vec<String>>,
        html: RefCell<Vec<String>>,
        fail_queries: bool,
    }

    impl HostBindings for RecordingHost {
        fn dbms_name(&self) -> String {
            "TestDB".into()
        }

        fn dbms_version(&self) -> String {
            "1.0".into()
        }

        fn env(&self, name: &str) -> Value {
            match name {
                "schema.name" => Value::from("public"),
                "object.id" => Value::Int(42),
                _ => Value::Null,
            }
        }

        fn exec(&self, query: &str, params: &[Value]) -> Result<Vec<DataTable>, ConnectionError> {
            if self.fail_queries {
                return Err(ConnectionError::Query("relation does not exist".into()));
            }
            self.queries.borrow_mut().push((query.to_string(), params.to_vec()));
            let table = DataTable::new(["name", "size"])
                .with_row(vec!["a".into(), Value::Int(1)])
                .with_row(vec!["b".into(), Value::Int(2)]);
            Ok(vec![table])
        }

        fn return_table(&self, table: DataTable) {
            self.tables.borrow_mut().push(table);
        }

        fn return_script(&self, text: String) {
            self.scripts.borrow_mut().push(text);
        }

        fn return_html(&self, text: String) {
            self.html.borrow_mut().push(text);
        }
    }

    fn run(program: &str, host: &RecordingHost) -> ScriptingResult<()> {
        LuaRuntime::new().evaluate("test", program, host)
    }

    #[test]
    fn test_env_and_return_script() {
        let host = RecordingHost::default();
        run(
            r#"returnScript("select * from " .. env("schema.name") .. " where id = " .. env("object.id"))"#,
            &host,
        )
        .unwrap();

        assert_eq!(*host.scripts.borrow(), vec!["select * from public where id = 42".to_string()]);
    }

    #[test]
    fn test_exec_forwards_params_and_returns_table() {
        let host = RecordingHost::default();
        run(
            r#"
            local t = exec("select name, size from objects where owner = ?", "alice", 3)
            assert(t:rowCount() == 2)
            assert(t:columnCount() == 2)
            assert(t:columnName(1) == "size")
            assert(t:value(1, 0) == "b")
            returnTable(t)
            "#,
            &host,
        )
        .unwrap();

        let queries = host.queries.borrow();
        assert_eq!(queries[0].1, vec![Value::from("alice"), Value::Int(3)]);
        assert_eq!(host.tables.borrow().len(), 1);
    }

    #[test]
    fn test_connection_handle() {
        let host = RecordingHost::default();
        run(
            r#"
            assert(connection.name == "TestDB")
            local t = connection.execute("select 1")
            returnHtml("<b>" .. connection.version .. "</b>")
            "#,
            &host,
        )
        .unwrap();

        assert_eq!(host.queries.borrow().len(), 1);
        assert_eq!(*host.html.borrow(), vec!["<b>1.0</b>".to_string()]);
    }

    #[test]
    fn test_connection_execute_method_call() {
        let host = RecordingHost::default();
        run(
            r#"
            local t = connection:execute("select name from objects where id = ?", 7)
            assert(t:rowCount() == 2)
            returnTable(t)
            "#,
            &host,
        )
        .unwrap();

        let queries = host.queries.borrow();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].0, "select name from objects where id = ?");
        assert_eq!(queries[0].1, vec![Value::Int(7)]);
        assert_eq!(host.tables.borrow().len(), 1);
    }

    #[test]
    fn test_connection_execute_requires_query() {
        let host = RecordingHost::default();
        let err = run("connection:execute()", &host).unwrap_err();

        assert!(matches!(
            err,
            ScriptingError::Script { ref message, .. } if message.contains("query string")
        ));
        assert!(host.queries.borrow().is_empty());
    }

    #[test]
    fn test_returned_handle_is_consumed() {
        let host = RecordingHost::default();
        let err = run(
            r#"
            local t = exec("select 1")
            returnTable(t)
            returnTable(t)
            "#,
            &host,
        )
        .unwrap_err();

        assert!(matches!(err, ScriptingError::Script { .. }));
        assert_eq!(host.tables.borrow().len(), 1);
    }

    #[test]
    fn test_runtime_error_reports_line() {
        let host = RecordingHost::default();
        let err = run("local a = 1\nlocal b = 2\nerror('boom')\n", &host).unwrap_err();

        match err {
            ScriptingError::Script { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let host = RecordingHost::default();
        let err = run("local a = 1\nlocal = \n", &host).unwrap_err();
        assert!(matches!(err, ScriptingError::Script { line: 2, .. }));
    }

    #[test]
    fn test_connection_failure_is_not_wrapped() {
        let host = RecordingHost {
            fail_queries: true,
            ..Default::default()
        };
        let err = run(r#"exec("select * from missing")"#, &host).unwrap_err();

        assert!(matches!(
            err,
            ScriptingError::Connection(ConnectionError::Query(ref m)) if m == "relation does not exist"
        ));
    }

    #[test]
    fn test_state_is_not_shared_between_evaluations() {
        let host = RecordingHost::default();
        run("leaked = 1", &host).unwrap();
        run("assert(leaked == nil)", &host).unwrap();
    }

    #[test]
    fn test_line_number_parsing() {
        assert_eq!(line_number(r#"runtime error: [string "x"]:12: oops"#), Some(12));
        assert_eq!(line_number("no location"), None);
    }
}
