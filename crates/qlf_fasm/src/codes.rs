//! Diagnostic codes emitted by the FASM parser.

use qlf_diagnostics::{Category, DiagnosticCode};

/// The line does not follow the FASM grammar.
pub const MALFORMED_LINE: DiagnosticCode = DiagnosticCode::new(Category::Fasm, 101);
/// The assigned value is not a valid number.
pub const INVALID_VALUE: DiagnosticCode = DiagnosticCode::new(Category::Fasm, 102);
/// The bit range is malformed or reversed.
pub const INVALID_RANGE: DiagnosticCode = DiagnosticCode::new(Category::Fasm, 103);
/// The value has set bits outside the addressed range.
pub const VALUE_TOO_WIDE: DiagnosticCode = DiagnosticCode::new(Category::Fasm, 104);
/// An annotation block is malformed.
pub const MALFORMED_ANNOTATION: DiagnosticCode = DiagnosticCode::new(Category::Fasm, 105);
/// An `unknown_bit` annotation does not hold a `wl_bl` coordinate.
pub const INVALID_UNKNOWN_BIT: DiagnosticCode = DiagnosticCode::new(Category::Fasm, 106);
