//! # Script Contexts

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// UI area a script is requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Context {
    Root,
    Tree,
    Content,
    Preview,
}

impl Context {
    pub const ALL: [Context; 4] = [
        Context::Root,
        Context::Tree,
        Context::Content,
        Context::Preview,
    ];

    /// Subdirectory of the DBMS script root, empty for `Root`
    pub fn subdir(&self) -> &'static str {
        match self {
            Context::Root => "",
            Context::Tree => "tree/",
            Context::Content => "content/",
            Context::Preview => "preview/",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Context::Root => "root",
            Context::Tree => "tree",
            Context::Content => "content",
            Context::Preview => "preview",
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Context {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Context::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown context '{}' (expected root, tree, content or preview)", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdirs() {
        assert_eq!(Context::Root.subdir(), "");
        assert_eq!(Context::Tree.subdir(), "tree/");
        assert_eq!(Context::Content.subdir(), "content/");
        assert_eq!(Context::Preview.subdir(), "preview/");
    }

    #[test]
    fn test_parse() {
        assert_eq!("Tree".parse::<Context>().unwrap(), Context::Tree);
        assert_eq!("root".parse::<Context>().unwrap(), Context::Root);
        assert!("grid".parse::<Context>().is_err());
    }
}
