//! Bitstream header and conversion options.
//!
//! PolarPro 3 bitstreams may start with a header:
//!
//! ```text
//! short: [command]
//! full:  [0xA5, command, ram_enable, 0, 0, 0]
//! ```
//!
//! Bit 7 of the command byte is always clear, so a command byte can never be
//! mistaken for the preamble.

use crate::error::BitstreamError;
use serde::{Deserialize, Serialize};

/// First byte of a full header.
pub const PREAMBLE: u8 = 0xA5;

/// Length of a full header in bytes.
pub const FULL_HEADER_LEN: usize = 6;

/// Requested header form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderMode {
    /// No header.
    #[default]
    None,
    /// One command byte.
    Short,
    /// Preamble, command byte, RAM block enables and three reserved bytes.
    Full,
}

/// Configuration oscillator frequency selected by the command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OscFreq {
    /// Low frequency (command bit clear).
    #[default]
    Low,
    /// High frequency.
    High,
}

/// The header command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Command(pub u8);

impl Command {
    /// Device configures itself from SPI flash.
    pub const SPI_MASTER: u8 = 1 << 0;
    /// Use the high-frequency configuration oscillator.
    pub const OSC_FREQ_HIGH: u8 = 1 << 1;
    /// A checksum trailer follows the data.
    pub const CHECKSUM_PRESENT: u8 = 1 << 2;
    /// Device verifies the checksum after writing the configuration.
    pub const CFG_WRITE_CHECKSUM_POST: u8 = 1 << 3;
    /// Device verifies the checksum after reading back the configuration.
    pub const CFG_READ_CHECKSUM_POST: u8 = 1 << 4;
    /// Mask the CFG_DONE output.
    pub const CFG_DONE_OUT_MASK: u8 = 1 << 5;
    /// A RAM payload follows the configuration data.
    pub const RAM_PRESENT: u8 = 1 << 6;
    /// Bits that may be set in a valid command byte.
    pub const VALID_MASK: u8 = 0x7F;

    /// Builds the command byte for a bitstream.
    pub fn from_options(options: &BitstreamOptions, checksum: bool, ram: bool) -> Self {
        let mut byte = 0;
        let flags = [
            (options.spi_master, Self::SPI_MASTER),
            (options.osc_freq == OscFreq::High, Self::OSC_FREQ_HIGH),
            (checksum, Self::CHECKSUM_PRESENT),
            (options.cfg_write_checksum_post, Self::CFG_WRITE_CHECKSUM_POST),
            (options.cfg_read_checksum_post, Self::CFG_READ_CHECKSUM_POST),
            (options.cfg_done_out_mask, Self::CFG_DONE_OUT_MASK),
            (ram, Self::RAM_PRESENT),
        ];
        for (enabled, bit) in flags {
            if enabled {
                byte |= bit;
            }
        }
        Command(byte)
    }

    /// Returns `true` if every bit of `flag` is set.
    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }
}

/// Which header form a bitstream carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderKind {
    /// One command byte.
    Short,
    /// Six bytes starting with [`PREAMBLE`].
    Full,
}

/// A decoded or to-be-written header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header form.
    pub kind: HeaderKind,
    /// Command byte.
    pub command: Command,
    /// RAM block enables, bit `bank × blocks_per_bank + block`. Always 0 in a short header.
    pub ram_enable: u8,
}

impl Header {
    /// Encoded length in bytes.
    pub fn len(&self) -> usize {
        match self.kind {
            HeaderKind::Short => 1,
            HeaderKind::Full => FULL_HEADER_LEN,
        }
    }

    /// Bytes at the start of the bitstream not covered by the checksum.
    pub fn preamble_len(&self) -> usize {
        match self.kind {
            HeaderKind::Short => 0,
            HeaderKind::Full => 1,
        }
    }

    /// Serializes the header.
    pub fn encode(&self) -> Vec<u8> {
        match self.kind {
            HeaderKind::Short => vec![self.command.0],
            HeaderKind::Full => vec![PREAMBLE, self.command.0, self.ram_enable, 0, 0, 0],
        }
    }

    /// Parses a header from the start of `data`.
    ///
    /// A leading [`PREAMBLE`] selects the full form; any other byte with
    /// bit 7 clear is a short header.
    pub fn decode(data: &[u8]) -> Result<Header, BitstreamError> {
        let first = *data.first().ok_or(BitstreamError::BitstreamLength {
            expected: 1,
            actual: 0,
        })?;
        if first == PREAMBLE {
            if data.len() < FULL_HEADER_LEN {
                return Err(BitstreamError::BitstreamLength {
                    expected: FULL_HEADER_LEN,
                    actual: data.len(),
                });
            }
            let command = data[1];
            if command & !Command::VALID_MASK != 0 {
                return Err(BitstreamError::InvalidHeader { byte: command });
            }
            return Ok(Header {
                kind: HeaderKind::Full,
                command: Command(command),
                ram_enable: data[2],
            });
        }
        if first & !Command::VALID_MASK != 0 {
            return Err(BitstreamError::InvalidHeader { byte: first });
        }
        Ok(Header {
            kind: HeaderKind::Short,
            command: Command(first),
            ram_enable: 0,
        })
    }
}

/// Options controlling bitstream framing, shared by encoding and decoding.
///
/// Framing options are ignored for families that do not support headers or
/// checksums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitstreamOptions {
    /// Header to write. When decoding, any value other than
    /// [`HeaderMode::None`] makes the decoder expect and detect a header.
    pub header: HeaderMode,
    /// Append a checksum trailer. When decoding without a header, whether
    /// one is expected.
    pub checksum: bool,
    /// Fail decoding on a checksum mismatch instead of warning.
    pub verify_checksum: bool,
    /// Command byte: SPI master mode.
    pub spi_master: bool,
    /// Command byte: oscillator frequency.
    pub osc_freq: OscFreq,
    /// Command byte: verify checksum after write.
    pub cfg_write_checksum_post: bool,
    /// Command byte: verify checksum after read-back.
    pub cfg_read_checksum_post: bool,
    /// Command byte: mask CFG_DONE.
    pub cfg_done_out_mask: bool,
}

impl Default for BitstreamOptions {
    fn default() -> Self {
        Self {
            header: HeaderMode::None,
            checksum: true,
            verify_checksum: true,
            spi_master: false,
            osc_freq: OscFreq::Low,
            cfg_write_checksum_post: false,
            cfg_read_checksum_post: false,
            cfg_done_out_mask: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_from_options() {
        let options = BitstreamOptions {
            spi_master: true,
            osc_freq: OscFreq::High,
            cfg_done_out_mask: true,
            ..BitstreamOptions::default()
        };
        let cmd = Command::from_options(&options, true, false);
        assert_eq!(cmd.0, 0b0010_0111);
        assert!(cmd.contains(Command::CHECKSUM_PRESENT));
        assert!(!cmd.contains(Command::RAM_PRESENT));
    }

    #[test]
    fn command_never_sets_bit_seven() {
        let options = BitstreamOptions {
            spi_master: true,
            osc_freq: OscFreq::High,
            cfg_write_checksum_post: true,
            cfg_read_checksum_post: true,
            cfg_done_out_mask: true,
            ..BitstreamOptions::default()
        };
        let cmd = Command::from_options(&options, true, true);
        assert_eq!(cmd.0, 0x7F);
        assert_ne!(cmd.0, PREAMBLE);
    }

    #[test]
    fn full_header_bytes() {
        let header = Header {
            kind: HeaderKind::Full,
            command: Command(Command::CHECKSUM_PRESENT | Command::RAM_PRESENT),
            ram_enable: 0b0000_0101,
        };
        assert_eq!(header.encode(), vec![0xA5, 0x44, 0x05, 0, 0, 0]);
        assert_eq!(header.len(), 6);
        assert_eq!(header.preamble_len(), 1);
        assert_eq!(Header::decode(&header.encode()).unwrap(), header);
    }

    #[test]
    fn short_header_bytes() {
        let header = Header {
            kind: HeaderKind::Short,
            command: Command(Command::SPI_MASTER),
            ram_enable: 0,
        };
        assert_eq!(header.encode(), vec![0x01]);
        assert_eq!(header.preamble_len(), 0);
        let decoded = Header::decode(&[0x01, 0xFF, 0xFF]).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn decode_rejects_high_bit() {
        assert_eq!(
            Header::decode(&[0x80]),
            Err(BitstreamError::InvalidHeader { byte: 0x80 })
        );
        assert_eq!(
            Header::decode(&[PREAMBLE, 0xC0, 0, 0, 0, 0]),
            Err(BitstreamError::InvalidHeader { byte: 0xC0 })
        );
    }

    #[test]
    fn decode_truncated() {
        assert_eq!(
            Header::decode(&[]),
            Err(BitstreamError::BitstreamLength {
                expected: 1,
                actual: 0
            })
        );
        assert_eq!(
            Header::decode(&[PREAMBLE, 0x04]),
            Err(BitstreamError::BitstreamLength {
                expected: 6,
                actual: 2
            })
        );
    }

    #[test]
    fn header_mode_serde_lowercase() {
        assert_eq!(serde_json::to_string(&HeaderMode::Full).unwrap(), "\"full\"");
        let mode: HeaderMode = serde_json::from_str("\"short\"").unwrap();
        assert_eq!(mode, HeaderMode::Short);
    }

    #[test]
    fn default_options() {
        let options = BitstreamOptions::default();
        assert_eq!(options.header, HeaderMode::None);
        assert!(options.checksum);
        assert!(options.verify_checksum);
    }
}
