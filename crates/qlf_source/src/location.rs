//! `path:line:col` locations for diagnostics.

use std::fmt;
use std::path::PathBuf;

/// A [`Span`](crate::Span) resolved to a file path and 1-based line/column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Path (or display name) of the source.
    pub path: PathBuf,
    /// 1-based line of the span start.
    pub line: u32,
    /// 1-based column of the span start, in bytes.
    pub col: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.col)
    }
}
