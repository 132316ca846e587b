//! Owner of all FASM text read during one run.

use crate::file_id::FileId;
use crate::location::Location;
use crate::span::Span;
use std::io;
use std::path::{Path, PathBuf};

/// Loaded text plus the byte offset of every line start.
struct Source {
    path: PathBuf,
    text: String,
    line_starts: Vec<u32>,
}

impl Source {
    fn new(path: PathBuf, text: String) -> Self {
        let mut line_starts = vec![0u32];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| (i + 1) as u32),
        );
        Self {
            path,
            text,
            line_starts,
        }
    }

    fn line_index(&self, offset: u32) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        }
    }

    fn line_bounds(&self, idx: usize) -> (u32, u32) {
        let start = self.line_starts[idx];
        let mut end = self
            .line_starts
            .get(idx + 1)
            .map(|&next| next - 1)
            .unwrap_or(self.text.len() as u32);
        if end > start && self.text.as_bytes()[end as usize - 1] == b'\r' {
            end -= 1;
        }
        (start, end)
    }
}

/// One line of a source, without its terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLine<'a> {
    /// 1-based line number.
    pub number: u32,
    /// Span of the line text.
    pub span: Span,
    /// The line text.
    pub text: &'a str,
}

/// The source database.
///
/// Holds every FASM file or in-memory string fed to the tool so that spans
/// stored on configuration bits stay resolvable until diagnostics are rendered.
#[derive(Default)]
pub struct SourceDb {
    files: Vec<Source>,
}

impl SourceDb {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a file from disk.
    pub fn load_file(&mut self, path: &Path) -> Result<FileId, io::Error> {
        let text = std::fs::read_to_string(path)?;
        Ok(self.add_source(path, text))
    }

    /// Adds in-memory text under a display name.
    pub fn add_source(&mut self, name: impl Into<PathBuf>, text: String) -> FileId {
        let id = FileId::from_raw(self.files.len() as u32);
        self.files.push(Source::new(name.into(), text));
        id
    }

    fn get(&self, id: FileId) -> Option<&Source> {
        self.files.get(id.as_raw() as usize)
    }

    /// Returns the full text of a source, or `""` for an unknown id.
    pub fn text(&self, id: FileId) -> &str {
        self.get(id).map(|s| s.text.as_str()).unwrap_or("")
    }

    /// Returns the display path of a source.
    pub fn path(&self, id: FileId) -> Option<&Path> {
        self.get(id).map(|s| s.path.as_path())
    }

    /// Iterates the lines of a source in order.
    pub fn lines(&self, id: FileId) -> impl Iterator<Item = SourceLine<'_>> + '_ {
        let source = self.get(id);
        let count = source.map(|s| s.line_starts.len()).unwrap_or(0);
        (0..count).filter_map(move |idx| {
            let source = source?;
            let (start, end) = source.line_bounds(idx);
            // A trailing newline does not open another line.
            if idx + 1 == count && start as usize == source.text.len() && idx > 0 {
                return None;
            }
            Some(SourceLine {
                number: idx as u32 + 1,
                span: Span::new(id, start, end),
                text: &source.text[start as usize..end as usize],
            })
        })
    }

    /// Resolves a span to its starting location. Synthetic spans resolve to `None`.
    pub fn resolve(&self, span: Span) -> Option<Location> {
        let source = self.get(span.file)?;
        let idx = source.line_index(span.start);
        Some(Location {
            path: source.path.clone(),
            line: idx as u32 + 1,
            col: span.start - source.line_starts[idx] + 1,
        })
    }

    /// Returns the text a span covers.
    pub fn snippet(&self, span: Span) -> &str {
        self.get(span.file)
            .and_then(|s| s.text.get(span.start as usize..span.end as usize))
            .unwrap_or("")
    }

    /// Returns the whole line containing the start of a span.
    pub fn line_of(&self, span: Span) -> Option<&str> {
        let source = self.get(span.file)?;
        let (start, end) = source.line_bounds(source.line_index(span.start));
        source.text.get(start as usize..end as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_strip_terminators() {
        let mut db = SourceDb::new();
        let id = db.add_source("a.fasm", "A\r\nB\nC".to_string());
        let lines: Vec<_> = db.lines(id).map(|l| (l.number, l.text)).collect();
        assert_eq!(lines, vec![(1, "A"), (2, "B"), (3, "C")]);
    }

    #[test]
    fn trailing_newline_adds_no_line() {
        let mut db = SourceDb::new();
        let id = db.add_source("a.fasm", "A\nB\n".to_string());
        assert_eq!(db.lines(id).count(), 2);
    }

    #[test]
    fn empty_source_has_one_empty_line() {
        let mut db = SourceDb::new();
        let id = db.add_source("a.fasm", String::new());
        let lines: Vec<_> = db.lines(id).collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "");
    }

    #[test]
    fn line_span_snippet_matches_text() {
        let mut db = SourceDb::new();
        let id = db.add_source("a.fasm", "first\nsecond line\n".to_string());
        let second = db.lines(id).nth(1).unwrap();
        assert_eq!(db.snippet(second.span), "second line");
    }

    #[test]
    fn resolve_location() {
        let mut db = SourceDb::new();
        let id = db.add_source("top.fasm", "abc\ndef\nghi".to_string());
        let loc = db.resolve(Span::new(id, 5, 6)).unwrap();
        assert_eq!(loc.path, PathBuf::from("top.fasm"));
        assert_eq!((loc.line, loc.col), (2, 2));
    }

    #[test]
    fn resolve_synthetic_is_none() {
        let db = SourceDb::new();
        assert!(db.resolve(Span::SYNTHETIC).is_none());
    }

    #[test]
    fn line_of_token() {
        let mut db = SourceDb::new();
        let id = db.add_source("a.fasm", "x\nFOO.BAR = 1\n".to_string());
        assert_eq!(db.line_of(Span::new(id, 6, 9)), Some("FOO.BAR = 1"));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.fasm");
        std::fs::write(&path, "X.Y\n").unwrap();
        let mut db = SourceDb::new();
        let id = db.load_file(&path).unwrap();
        assert_eq!(db.text(id), "X.Y\n");
        assert_eq!(db.path(id), Some(path.as_path()));
    }
}
