//! FASM (FPGA Assembly) text: parsing into feature assignments and rendering.
//!
//! # Format
//!
//! ```text
//! X1Y1.LOGIC.LOGIC.Ipwr_gates.J_pwr_st
//! X3Y1.RAM.RAM.INIT[9215:0] = 9216'h0…
//! X2Y3.INV.ASSP[3:0] = 4'b1010 # comment
//! { unknown_bit = "12_40" }
//! ```
//!
//! A line may hold a feature with an optional `[hi]` / `[hi:lo]` range and
//! an optional `= VALUE`, followed by `{ key = "value", … }` annotations and
//! a `#` comment. Each part is optional, so blank lines and comment-only
//! lines are valid.

#![warn(missing_docs)]

pub mod codes;
pub mod line;
pub mod output;
pub mod parser;
pub mod value;

pub use line::{Annotation, FasmLine, UNKNOWN_BIT};
pub use output::FasmOutput;
pub use parser::{parse_fasm, parse_line};
pub use value::parse_value;
