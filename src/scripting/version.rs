//! # Version Segments
//!
//! A script may carry several variants for different DBMS versions,
//! delimited by marker comments:
//!
//! ```text
//! /* V90000+ */
//! select s.datname, s.pid, s.usename from pg_stat_activity s
//!
//! /* V100000+ */
//! select s.datname, s.pid, s.backend_type, s.usename from pg_stat_activity s
//! ```
//!
//! The variant kept is the one with the highest version not above the
//! connection's comparable version. Markers are stripped from the result.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

/// Target version meaning "no comparison, keep the script as written".
///
/// Root-level scripts are loaded with it because the comparable version may
/// itself come from a root-level script.
pub const UNVERSIONED: i64 = -1;

fn marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"/\*\s*V(\d+)\+\s*\*/").expect("valid marker regex"))
}

/// Split `body` into `(version, segment)` pairs in text order.
///
/// Text before the first marker belongs to no segment. Empty when the body
/// has no markers. A marker whose version does not fit in an `i64` is not a
/// marker: its text stays inside the surrounding segment.
pub fn segments(body: &str) -> Vec<(i64, &str)> {
    // (start, end, version) of every marker token
    let markers: Vec<(usize, usize, i64)> = marker()
        .captures_iter(body)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let version = caps.get(1)?.as_str().parse::<i64>().ok()?;
            Some((whole.start(), whole.end(), version))
        })
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(i, &(_, end, version))| {
            let next = markers.get(i + 1).map_or(body.len(), |m| m.0);
            (version, &body[end..next])
        })
        .collect()
}

/// Extract the part of `body` valid for `target_version`.
///
/// Returns the body unchanged when it has no markers or when
/// `target_version` is [`UNVERSIONED`]; returns an empty string when every
/// marker is above `target_version`.
pub fn select(body: &str, target_version: i64) -> String {
    if target_version == UNVERSIONED {
        return body.to_string();
    }

    let parts = segments(body);
    if parts.is_empty() {
        return body.to_string();
    }

    // Later duplicates replace earlier ones
    let by_version: BTreeMap<i64, &str> = parts.into_iter().collect();
    by_version
        .range(..=target_version)
        .next_back()
        .map(|(_, text)| text.to_string())
        .unwrap_or_default()
}
