//! Script Store Tests
//!
//! Lazy per-directory scanning and caching:
//! - Scripts keyed by base name, kind by extension
//! - Version segments selected with the comparable version
//! - Root scripts kept verbatim
//! - Cached until an explicit refresh

mod common;

use std::fs;

use common::{FakeConnection, ScriptTree};
use dbscripts::scripting::{Context, PathResolver, ScriptKind, ScriptStore, ScriptingError};

// =============================================================================
// Helper Functions
// =============================================================================

fn store_for(tree: &ScriptTree) -> ScriptStore {
    ScriptStore::new(PathResolver::new(tree.root()))
}

// =============================================================================
// Lookup Tests
// =============================================================================

#[test]
fn test_get_script_by_object_type() {
    let tree = ScriptTree::new();
    tree.file("postgresql/content/tables.sql", "select * from pg_tables");
    tree.file("postgresql/content/stats.qs", "returnScript('x')");
    let store = store_for(&tree);
    let mut conn = FakeConnection::postgres();

    let tables = store.get_script(&mut conn, Context::Content, "tables").unwrap().unwrap();
    assert_eq!(tables.body, "select * from pg_tables");
    assert_eq!(tables.kind, ScriptKind::Sql);

    let stats = store.get_script(&mut conn, Context::Content, "stats").unwrap().unwrap();
    assert_eq!(stats.kind, ScriptKind::Interpreted);

    assert!(store.get_script(&mut conn, Context::Content, "views").unwrap().is_none());
}

#[test]
fn test_versioned_script_uses_comparable_version() {
    let tree = ScriptTree::new();
    tree.file(
        "postgresql/content/activity.sql",
        "/* V90000+ */select pid from pg_stat_activity/* V100000+ */select pid, backend_type from pg_stat_activity",
    );
    let store = store_for(&tree);

    let mut old = FakeConnection::new("PostgreSQL", "9.6", 90600);
    let script = store.get_script(&mut old, Context::Content, "activity").unwrap().unwrap();
    assert_eq!(script.body, "select pid from pg_stat_activity");

    // Different identity, same directory: the cached bunch is reused
    let mut new = FakeConnection::new("PostgreSQL", "16.2", 160002);
    let script = store.get_script(&mut new, Context::Content, "activity").unwrap().unwrap();
    assert_eq!(script.body, "select pid from pg_stat_activity");

    store.refresh(&mut new, Context::Content).unwrap();
    let script = store.get_script(&mut new, Context::Content, "activity").unwrap().unwrap();
    assert_eq!(script.body, "select pid, backend_type from pg_stat_activity");
}

#[test]
fn test_root_scripts_are_unversioned() {
    let tree = ScriptTree::new();
    let body = "/* V1+ */select 1/* V2+ */select 2";
    tree.file("postgresql/version.sql", body);
    let store = store_for(&tree);
    let mut conn = FakeConnection::postgres();

    let script = store.get_script(&mut conn, Context::Root, "version").unwrap().unwrap();
    assert_eq!(script.body, body);
}

#[test]
fn test_object_types_sorted() {
    let tree = ScriptTree::new();
    tree.file("postgresql/tree/views.sql", "");
    tree.file("postgresql/tree/columns.qs", "");
    tree.file("postgresql/tree/README.md", "");
    let store = store_for(&tree);
    let mut conn = FakeConnection::postgres();

    let types = store.object_types(&mut conn, Context::Tree).unwrap();
    assert_eq!(
        types,
        vec![
            ("columns".to_string(), ScriptKind::Interpreted),
            ("views".to_string(), ScriptKind::Sql),
        ]
    );
}

// =============================================================================
// Caching Tests
// =============================================================================

#[test]
fn test_file_changes_need_refresh() {
    let tree = ScriptTree::new();
    let file = tree.file("postgresql/content/tables.sql", "select 1");
    let store = store_for(&tree);
    let mut conn = FakeConnection::postgres();

    store.get_script(&mut conn, Context::Content, "tables").unwrap();
    fs::write(&file, "select 2").unwrap();
    tree.file("postgresql/content/indexes.sql", "select 3");

    let cached = store.get_script(&mut conn, Context::Content, "tables").unwrap().unwrap();
    assert_eq!(cached.body, "select 1");
    assert!(store.get_script(&mut conn, Context::Content, "indexes").unwrap().is_none());

    store.refresh(&mut conn, Context::Content).unwrap();
    let fresh = store.get_script(&mut conn, Context::Content, "tables").unwrap().unwrap();
    assert_eq!(fresh.body, "select 2");
    assert!(store.get_script(&mut conn, Context::Content, "indexes").unwrap().is_some());
}

/// A scanned directory without scripts is remembered as loaded, not rescanned.
#[test]
fn test_empty_directory_is_loaded_once() {
    let tree = ScriptTree::new();
    tree.dir("postgresql/preview");
    let store = store_for(&tree);
    let mut conn = FakeConnection::postgres();

    assert!(store.get_script(&mut conn, Context::Preview, "tables").unwrap().is_none());
    tree.file("postgresql/preview/tables.sql", "select 1");
    assert!(store.get_script(&mut conn, Context::Preview, "tables").unwrap().is_none());

    store.refresh(&mut conn, Context::Preview).unwrap();
    assert!(store.get_script(&mut conn, Context::Preview, "tables").unwrap().is_some());
}

#[test]
fn test_failed_refresh_discards_bunch() {
    let tree = ScriptTree::new();
    tree.file("postgresql/content/tables.sql", "select 1");
    let bad = tree.root().join("postgresql/content/broken.sql");
    let store = store_for(&tree);
    let mut conn = FakeConnection::postgres();

    store.get_script(&mut conn, Context::Content, "tables").unwrap();
    fs::write(&bad, [0xc3, 0x28]).unwrap();

    let err = store.refresh(&mut conn, Context::Content).unwrap_err();
    assert!(matches!(err, ScriptingError::Io { ref path, .. } if path == &bad));

    // The next lookup scans again and hits the same error
    let err = store.get_script(&mut conn, Context::Content, "tables").unwrap_err();
    assert_eq!(err.code(), "DBS_IO");

    fs::remove_file(&bad).unwrap();
    assert!(store.get_script(&mut conn, Context::Content, "tables").unwrap().is_some());
}

#[test]
fn test_clear_forgets_bunches() {
    let tree = ScriptTree::new();
    tree.file("postgresql/content/tables.sql", "select 1");
    let store = store_for(&tree);
    let mut conn = FakeConnection::postgres();
    store.get_script(&mut conn, Context::Content, "tables").unwrap();

    tree.file("postgresql/content/indexes.sql", "select 2");
    store.clear().unwrap();
    assert!(store.get_script(&mut conn, Context::Content, "indexes").unwrap().is_some());
}
