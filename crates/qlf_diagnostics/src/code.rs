//! Diagnostic codes: a subsystem letter plus a three-digit number.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The subsystem a diagnostic originates from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// FASM parsing, prefixed with `F`.
    Fasm,
    /// Bitstream encoding and decoding, prefixed with `B`.
    Bitstream,
    /// Feature database loading, prefixed with `D`.
    Database,
    /// RAM initialization, prefixed with `R`.
    Ram,
    /// Configuration and device selection, prefixed with `C`.
    Config,
}

impl Category {
    /// Returns the prefix letter.
    pub fn prefix(self) -> char {
        match self {
            Category::Fasm => 'F',
            Category::Bitstream => 'B',
            Category::Database => 'D',
            Category::Ram => 'R',
            Category::Config => 'C',
        }
    }
}

/// A diagnostic code such as `B203`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// Originating subsystem.
    pub category: Category,
    /// Number within the subsystem.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
