//! Warnings, errors and notes produced while converting FASM and bitstreams.
//!
//! Diagnostics are the tool's log: recoverable conditions (an ignored
//! checksum mismatch, a conflicting bit assignment) are emitted into a
//! [`DiagnosticSink`] and rendered at the end of the run by a
//! [`TerminalRenderer`] or serialized as JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod label;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use label::Label;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
