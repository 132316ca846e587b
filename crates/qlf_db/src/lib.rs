//! Feature database loader for QuickLogic devices.
//!
//! A database directory holds any number of `*.db` tables. Each table maps
//! feature names to the configuration cells they set or clear:
//!
//! ```text
//! # comment
//! X1Y1.LOGIC.LOGIC.Ipwr_gates.J_pwr_st 5_5 5_6
//! X1Y1.QMUX.QMUX.QCKS !12_40
//! ```
//!
//! Tables are read in file-name order and their features are concatenated;
//! that order is the iteration order seen by the disassembler.

#![warn(missing_docs)]

pub mod error;
pub mod tables;

pub use error::DatabaseError;
pub use tables::{parse_bit_spec, parse_table, FeatureTables};
