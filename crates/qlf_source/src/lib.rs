//! In-memory FASM sources and byte spans.
//!
//! Every configuration bit written by the assembler remembers the [`Span`] of
//! the FASM line that wrote it. The [`SourceDb`] owns the text those spans
//! point into and turns them into `path:line:col` [`Location`]s for
//! diagnostics.

#![warn(missing_docs)]

pub mod file_id;
pub mod location;
pub mod source_db;
pub mod span;

pub use file_id::FileId;
pub use location::Location;
pub use source_db::{SourceDb, SourceLine};
pub use span::Span;
