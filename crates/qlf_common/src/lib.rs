//! Shared foundational types used across the qlfasm toolchain.
//!
//! This crate provides the configuration-cell [`Coord`] (wordline, bitline)
//! and [`BitValue`], the arbitrary-width 2-state integer carried by FASM
//! assignments and RAM initialization data.

#![warn(missing_docs)]

pub mod bit_value;
pub mod coord;

pub use bit_value::BitValue;
pub use coord::{Coord, ParseCoordError};
