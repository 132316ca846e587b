//! Identifier of a source loaded into a [`SourceDb`](crate::SourceDb).

use serde::{Deserialize, Serialize};

/// Index of a source in the [`SourceDb`](crate::SourceDb).
///
/// Handed out in load order. [`FileId::SYNTHETIC`] marks bits and
/// diagnostics that have no text behind them, such as bits seeded from a
/// default bitstream.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct FileId(u32);

impl FileId {
    /// File id of spans that do not point into any loaded source.
    pub const SYNTHETIC: FileId = FileId(u32::MAX);

    /// Wraps a raw index.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_roundtrip() {
        assert_eq!(FileId::from_raw(3).as_raw(), 3);
    }

    #[test]
    fn synthetic_is_distinct() {
        assert_ne!(FileId::SYNTHETIC, FileId::from_raw(0));
    }

    #[test]
    fn serde_roundtrip() {
        let id = FileId::from_raw(9);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(serde_json::from_str::<FileId>(&json).unwrap(), id);
    }
}
