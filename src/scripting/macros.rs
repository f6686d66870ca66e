//! # Macro Expansion
//!
//! Scripts reference environment values through `$namespace.name$`
//! placeholders, e.g. `$schema.id$`. Expansion is textual and single-pass:
//! substituted values are never expanded again.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::connection::Value;

/// Text substituted for values whose text form is empty
pub const NULL_LITERAL: &str = "NULL";

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$(\w+\.\w+)\$").expect("valid placeholder regex"))
}

/// Distinct placeholder names in order of first appearance
pub fn placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in placeholder().captures_iter(text) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Replace every placeholder in `text` with the value `resolve` returns.
///
/// `resolve` is called once per distinct name, in order of first
/// appearance.
pub fn expand_macros<F>(text: &str, mut resolve: F) -> String
where
    F: FnMut(&str) -> Value,
{
    let names = placeholders(text);
    if names.is_empty() {
        return text.to_string();
    }

    let values: HashMap<String, String> = names
        .into_iter()
        .map(|name| {
            let value = resolve(&name).to_text();
            let rendered = if value.is_empty() {
                NULL_LITERAL.to_string()
            } else {
                value
            };
            (name, rendered)
        })
        .collect();

    placeholder()
        .replace_all(text, |caps: &Captures<'_>| {
            values.get(&caps[1]).cloned().unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
