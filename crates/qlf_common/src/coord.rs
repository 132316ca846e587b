//! Configuration-cell coordinates on the wordline/bitline grid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One configuration cell, addressed by wordline and bitline index.
///
/// Coordinates order by wordline first, then bitline, which is also the
/// order used whenever a set of coordinates is printed. The textual form is
/// `"{wl}_{bl}"`, shared by feature database files and `unknown_bit`
/// annotations.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Coord {
    /// Wordline index.
    pub wl: u32,
    /// Bitline index.
    pub bl: u32,
}

impl Coord {
    /// Creates a coordinate from a wordline and bitline index.
    pub const fn new(wl: u32, bl: u32) -> Self {
        Self { wl, bl }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.wl, self.bl)
    }
}

/// Error type for parsing `"wl_bl"` coordinate strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCoordError {
    /// The input string that failed to parse.
    pub input: String,
}

impl fmt::Display for ParseCoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid coordinate '{}': expected 'wl_bl'", self.input)
    }
}

impl std::error::Error for ParseCoordError {}

impl FromStr for Coord {
    type Err = ParseCoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCoordError {
            input: s.to_string(),
        };
        let (wl, bl) = s.trim().split_once('_').ok_or_else(err)?;
        let wl = wl.parse::<u32>().map_err(|_| err())?;
        let bl = bl.parse::<u32>().map_err(|_| err())?;
        Ok(Coord { wl, bl })
    }
}
