//! The configuration bit store.
//!
//! A sparse map from cell coordinate to value. Absent cells encode as 0.
//! Every written cell remembers which FASM line wrote it, so conflicting
//! assignments can point at both lines.

use qlf_common::Coord;
use qlf_source::Span;
use std::collections::BTreeMap;

/// A stored cell value and its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredBit {
    /// Cell value.
    pub value: bool,
    /// FASM line that wrote the value, or `None` for seeded and decoded cells.
    pub origin: Option<Span>,
}

/// Sparse configuration image, ordered by coordinate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigBitStore {
    bits: BTreeMap<Coord, StoredBit>,
}

impl ConfigBitStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a cell, returning the previous entry. Last write wins.
    pub fn set(&mut self, coord: Coord, value: bool, origin: Option<Span>) -> Option<StoredBit> {
        self.bits.insert(coord, StoredBit { value, origin })
    }

    /// Returns the stored entry of a cell.
    pub fn get(&self, coord: Coord) -> Option<StoredBit> {
        self.bits.get(&coord).copied()
    }

    /// Returns the value a cell encodes as (absent cells are 0).
    pub fn value(&self, coord: Coord) -> bool {
        self.bits.get(&coord).is_some_and(|b| b.value)
    }

    /// Iterates stored cells in coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, StoredBit)> + '_ {
        self.bits.iter().map(|(&c, &b)| (c, b))
    }

    /// Iterates the coordinates of cells stored as 1, in order.
    pub fn set_coords(&self) -> impl Iterator<Item = Coord> + '_ {
        self.bits.iter().filter(|(_, b)| b.value).map(|(&c, _)| c)
    }

    /// Number of stored cells.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}
