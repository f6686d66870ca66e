//! dbscripts - versioned database introspection scripts
//!
//! Resolves, version-selects, macro-expands and executes the scripts a
//! database browser uses to populate its object tree, content views and
//! previews.
//!
//! - [`connection`]: the database collaborator and tabular results
//! - [`scripting`]: resolution, caching and dual-mode execution
//! - [`observability`]: logging setup and event names
//! - [`cli`]: the `dbscripts` binary

pub mod cli;
pub mod connection;
pub mod observability;
pub mod scripting;
