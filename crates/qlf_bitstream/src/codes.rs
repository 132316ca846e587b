//! Diagnostic codes emitted by the codec.

use qlf_diagnostics::{Category, DiagnosticCode};

/// A FASM line names a feature the database does not have.
pub const UNKNOWN_FEATURE: DiagnosticCode = DiagnosticCode::new(Category::Bitstream, 101);
/// A feature references a cell outside the device grid.
pub const COORDINATE_OUT_OF_RANGE: DiagnosticCode = DiagnosticCode::new(Category::Bitstream, 102);
/// The bitstream checksum does not match its content.
pub const CHECKSUM_MISMATCH: DiagnosticCode = DiagnosticCode::new(Category::Bitstream, 103);
/// The bitstream is shorter than the device requires.
pub const BITSTREAM_LENGTH: DiagnosticCode = DiagnosticCode::new(Category::Bitstream, 104);
/// The first byte is neither a preamble nor a command byte.
pub const INVALID_HEADER: DiagnosticCode = DiagnosticCode::new(Category::Bitstream, 105);

/// Checksum mismatch accepted because verification is off.
pub const CHECKSUM_IGNORED: DiagnosticCode = DiagnosticCode::new(Category::Bitstream, 201);
/// Bytes after the expected end of the bitstream were dropped.
pub const TRAILING_BYTES: DiagnosticCode = DiagnosticCode::new(Category::Bitstream, 202);
/// Two FASM lines wrote different values to the same cell.
pub const CONFLICTING_ASSIGNMENT: DiagnosticCode = DiagnosticCode::new(Category::Bitstream, 203);
/// The header was upgraded to the full form to describe enabled RAM blocks.
pub const HEADER_PROMOTED: DiagnosticCode = DiagnosticCode::new(Category::Bitstream, 204);
/// No default bitstream was found to seed the configuration.
pub const NO_DEFAULT_BITSTREAM: DiagnosticCode = DiagnosticCode::new(Category::Bitstream, 205);

/// A RAM init range does not cover whole blocks of one bank.
pub const INVALID_RAM_BANK_SIZE: DiagnosticCode = DiagnosticCode::new(Category::Ram, 101);
/// RAM initialization requested on a device without RAM support.
pub const UNIMPLEMENTED_RAM: DiagnosticCode = DiagnosticCode::new(Category::Ram, 102);
