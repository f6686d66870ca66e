//! dbscripts CLI entry point
//!
//! Parses nothing itself: everything, including configuration and logging
//! setup, is delegated to the CLI module. Errors are printed to stderr as
//! `CODE: message` and the process exits non-zero.

use dbscripts::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
