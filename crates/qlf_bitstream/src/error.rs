//! Fatal codec errors.

use crate::codes;
use qlf_common::Coord;
use qlf_diagnostics::Diagnostic;
use qlf_source::Span;

/// Errors that abort a conversion.
///
/// Each error converts to a [`Diagnostic`] carrying the span of the FASM
/// line that caused it, so fatal errors render like any other diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitstreamError {
    /// The database has no feature with this name.
    #[error("unknown feature '{feature}'")]
    UnknownFeature {
        /// Requested feature name.
        feature: String,
        /// Line that requested it.
        span: Span,
    },

    /// A feature maps to a cell outside the device grid.
    #[error("feature '{feature}' references cell {coord} outside the device grid")]
    CoordinateOutOfRange {
        /// Feature (or `unknown_bit` annotation) being applied.
        feature: String,
        /// Offending cell.
        coord: Coord,
        /// Line that requested it.
        span: Span,
    },

    /// The checksum trailer does not match the data.
    #[error("checksum mismatch: bitstream has {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Value stored in the bitstream.
        expected: u32,
        /// Value computed over the data.
        computed: u32,
    },

    /// The bitstream is too short for the device.
    #[error("bitstream too short: expected {expected} bytes, found {actual}")]
    BitstreamLength {
        /// Minimum length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },

    /// A RAM init range is not one or two whole blocks of a bank.
    #[error("invalid RAM initialization size for '{feature}': {width} bits")]
    InvalidRamBankSize {
        /// RAM init feature name.
        feature: String,
        /// Width of the requested range in bits.
        width: u32,
        /// Line that requested it.
        span: Span,
    },

    /// RAM initialization is not supported on this device.
    #[error("RAM initialization is not supported on this device: '{feature}'")]
    UnimplementedRam {
        /// RAM init feature name.
        feature: String,
        /// Line that requested it.
        span: Span,
    },

    /// The first bitstream byte is not a valid header.
    #[error("invalid bitstream header byte {byte:#04x}")]
    InvalidHeader {
        /// The offending byte.
        byte: u8,
    },
}

impl BitstreamError {
    /// Source span the error refers to, or [`Span::SYNTHETIC`].
    pub fn span(&self) -> Span {
        match self {
            BitstreamError::UnknownFeature { span, .. }
            | BitstreamError::CoordinateOutOfRange { span, .. }
            | BitstreamError::InvalidRamBankSize { span, .. }
            | BitstreamError::UnimplementedRam { span, .. } => *span,
            BitstreamError::ChecksumMismatch { .. }
            | BitstreamError::BitstreamLength { .. }
            | BitstreamError::InvalidHeader { .. } => Span::SYNTHETIC,
        }
    }

    /// Converts the error into an error diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            BitstreamError::UnknownFeature { .. } => codes::UNKNOWN_FEATURE,
            BitstreamError::CoordinateOutOfRange { .. } => codes::COORDINATE_OUT_OF_RANGE,
            BitstreamError::ChecksumMismatch { .. } => codes::CHECKSUM_MISMATCH,
            BitstreamError::BitstreamLength { .. } => codes::BITSTREAM_LENGTH,
            BitstreamError::InvalidRamBankSize { .. } => codes::INVALID_RAM_BANK_SIZE,
            BitstreamError::UnimplementedRam { .. } => codes::UNIMPLEMENTED_RAM,
            BitstreamError::InvalidHeader { .. } => codes::INVALID_HEADER,
        };
        let diag = Diagnostic::error(code, self.to_string(), self.span());
        match self {
            BitstreamError::InvalidRamBankSize { .. } => diag.with_help(
                "RAM init ranges must start on a 9216-bit block boundary and span one or two blocks",
            ),
            BitstreamError::ChecksumMismatch { .. } => {
                diag.with_help("pass --no-verify-checksum to decode anyway")
            }
            _ => diag,
        }
    }
}
