//! Byte ranges inside a loaded source.

use crate::file_id::FileId;
use serde::{Deserialize, Serialize};

/// A half-open byte range `start..end` inside one source.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Span {
    /// Source the range belongs to.
    pub file: FileId,
    /// First byte (inclusive).
    pub start: u32,
    /// One past the last byte.
    pub end: u32,
}

impl Span {
    /// Span carried by data that did not come from any text.
    pub const SYNTHETIC: Span = Span {
        file: FileId::SYNTHETIC,
        start: 0,
        end: 0,
    };

    /// Creates a span.
    pub fn new(file: FileId, start: u32, end: u32) -> Self {
        Self { file, start, end }
    }

    /// Returns a span covering `offset..offset + len` relative to this span's start.
    ///
    /// Used to narrow a whole-line span down to one token of the line.
    pub fn sub(self, offset: usize, len: usize) -> Span {
        let start = self.start + offset as u32;
        Span {
            file: self.file,
            start,
            end: (start + len as u32).min(self.end.max(start)),
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Returns `true` for a zero-length span.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` if this span has no source text behind it.
    pub fn is_synthetic(&self) -> bool {
        self.file == FileId::SYNTHETIC
    }
}
