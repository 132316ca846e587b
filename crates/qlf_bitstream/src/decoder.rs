//! Bitstream bytes → configuration bits.

use crate::checksum::fletcher32;
use crate::codes;
use crate::config_bits::ConfigBitStore;
use crate::error::BitstreamError;
use crate::framing::{BitstreamOptions, Command, Header, HeaderKind, HeaderMode, PREAMBLE};
use crate::geometry::DeviceGeometry;
use crate::layout::decode_config_bits;
use crate::ram::{payload_len, RamImage};
use qlf_diagnostics::{Diagnostic, DiagnosticSink};
use qlf_source::Span;

/// Result of [`decode_bitstream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBitstream {
    /// Every non-padding cell of the device.
    pub store: ConfigBitStore,
    /// Header found at the start of the data.
    pub header: Option<Header>,
    /// RAM payload, when the header announced one.
    pub ram: Option<RamImage>,
}

/// Decodes a complete bitstream.
///
/// On families with headers, a leading [`PREAMBLE`] always starts a full
/// header. Bank 0 pads bit-number 0, so bit 0 of a headerless stream's first
/// byte is clear and the preamble cannot occur there. A short header has no
/// such marker and is read only when `options.header` is not
/// [`HeaderMode::None`]. A checksum trailer is expected when the header says so,
/// or, without a header, when `options.checksum` is set. A checksum
/// mismatch is fatal with `options.verify_checksum` and a warning
/// otherwise. Input shorter than the device requires is an error; excess
/// bytes are dropped with a warning.
pub fn decode_bitstream(
    geom: &DeviceGeometry,
    data: &[u8],
    options: &BitstreamOptions,
    sink: &DiagnosticSink,
) -> Result<DecodedBitstream, BitstreamError> {
    let header = match data.first() {
        _ if !geom.framing.header => None,
        Some(&PREAMBLE) => Some(Header::decode(data)?),
        _ if options.header != HeaderMode::None => Some(Header::decode(data)?),
        _ => None,
    };
    let header_len = header.map(|h| h.len()).unwrap_or(0);

    let has_checksum = geom.framing.checksum
        && match header {
            Some(h) => h.command.contains(Command::CHECKSUM_PRESENT),
            None => options.checksum,
        };
    let trailer_len = if has_checksum { 4 } else { 0 };

    let ram_layout = geom.ram.as_ref().filter(|layout| layout.payload);
    let ram_enable = match (header, ram_layout) {
        (Some(h), Some(_)) if h.kind == HeaderKind::Full => h.ram_enable,
        _ => 0,
    };
    let ram_len = ram_layout
        .map(|layout| payload_len(layout, ram_enable))
        .unwrap_or(0);

    let body_len = geom.config_bytes() + ram_len;
    let expected = header_len + body_len + trailer_len;
    if data.len() < expected {
        return Err(BitstreamError::BitstreamLength {
            expected,
            actual: data.len(),
        });
    }

    let mut end = data.len();
    if has_checksum {
        end -= 4;
        let mut stored = [0u8; 4];
        stored.copy_from_slice(&data[end..]);
        let stored = u32::from_le_bytes(stored);
        let skip = header.map(|h| h.preamble_len()).unwrap_or(0);
        let computed = fletcher32(&data[skip..end]);
        if stored != computed {
            if options.verify_checksum {
                return Err(BitstreamError::ChecksumMismatch {
                    expected: stored,
                    computed,
                });
            }
            sink.emit(
                Diagnostic::warning(
                    codes::CHECKSUM_IGNORED,
                    "bitstream checksum mismatch ignored",
                    Span::SYNTHETIC,
                )
                .with_note(format!(
                    "bitstream has {stored:#010x}, computed {computed:#010x}"
                )),
            );
        }
    }

    let body = &data[header_len..end];
    if body.len() > body_len {
        sink.emit(
            Diagnostic::warning(
                codes::TRAILING_BYTES,
                format!(
                    "ignoring {} trailing bytes after the {} bitstream",
                    body.len() - body_len,
                    geom.name
                ),
                Span::SYNTHETIC,
            )
            .with_note(format!("expected {expected} bytes, found {}", data.len())),
        );
    }

    let store = decode_config_bits(geom, body);
    let ram = match ram_layout {
        Some(layout) if ram_enable != 0 => {
            let start = geom.config_bytes();
            Some(RamImage::decode(layout, ram_enable, &body[start..start + ram_len]))
        }
        _ => None,
    };

    Ok(DecodedBitstream { store, header, ram })
}
