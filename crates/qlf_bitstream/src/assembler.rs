//! FASM feature assignments → configuration bits → bitstream bytes.

use crate::checksum::fletcher32;
use crate::codes;
use crate::config_bits::ConfigBitStore;
use crate::error::BitstreamError;
use crate::framing::{BitstreamOptions, Command, Header, HeaderKind, HeaderMode};
use crate::geometry::DeviceGeometry;
use crate::layout::encode_config_bits;
use crate::ram::RamState;
use crate::{FeatureDatabase, RAM_INIT_SUFFIX};
use qlf_common::{BitValue, Coord};
use qlf_diagnostics::{Diagnostic, DiagnosticSink, Label};
use qlf_source::Span;

/// An inclusive bit range `[end:start]` of a multi-bit feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    /// Lowest index.
    pub start: u32,
    /// Highest index.
    pub end: u32,
}

impl BitRange {
    /// Number of indices covered.
    pub fn width(&self) -> u32 {
        self.end.saturating_sub(self.start).saturating_add(1)
    }
}

/// One parsed FASM assignment: `FEATURE[end:start] = value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureAssignment {
    /// Feature name without the range suffix.
    pub feature: String,
    /// Assigned value; bit 0 corresponds to `range.start`.
    pub value: BitValue,
    /// Range, for multi-bit features.
    pub range: Option<BitRange>,
    /// Span of the FASM line.
    pub origin: Span,
}

impl FeatureAssignment {
    /// A single-bit enable (`FEATURE` or `FEATURE = 1`).
    pub fn enable(feature: impl Into<String>, origin: Span) -> Self {
        Self {
            feature: feature.into(),
            value: BitValue::from_u64(1, 1),
            range: None,
            origin,
        }
    }
}

/// Output of [`Assembler::produce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedBitstream {
    /// The complete bitstream.
    pub data: Vec<u8>,
    /// Memory side file content, when any RAM cell was initialized.
    pub ram_mem: Option<String>,
    /// Header written at the start of `data`, if any.
    pub header: Option<Header>,
}

/// Builds a configuration from feature assignments.
///
/// Create one with [`new`](Self::new) or seed it from a decoded default
/// bitstream with [`with_seed`](Self::with_seed), apply any number of
/// assignments, then consume it with [`produce`](Self::produce).
pub struct Assembler<'a> {
    geometry: &'a DeviceGeometry,
    db: &'a dyn FeatureDatabase,
    sink: &'a DiagnosticSink,
    store: ConfigBitStore,
    ram: RamState,
}

impl<'a> Assembler<'a> {
    /// Creates an assembler with an empty configuration.
    pub fn new(
        geometry: &'a DeviceGeometry,
        db: &'a dyn FeatureDatabase,
        sink: &'a DiagnosticSink,
    ) -> Self {
        Self::with_seed(geometry, db, sink, ConfigBitStore::new())
    }

    /// Creates an assembler starting from an existing configuration.
    pub fn with_seed(
        geometry: &'a DeviceGeometry,
        db: &'a dyn FeatureDatabase,
        sink: &'a DiagnosticSink,
        seed: ConfigBitStore,
    ) -> Self {
        Self {
            geometry,
            db,
            sink,
            store: seed,
            ram: RamState::new(),
        }
    }

    /// The configuration built so far.
    pub fn store(&self) -> &ConfigBitStore {
        &self.store
    }

    /// RAM cells and block enables collected so far.
    pub fn ram(&self) -> &RamState {
        &self.ram
    }

    /// Applies one FASM assignment.
    ///
    /// A zero value leaves the configuration unchanged, except for RAM init
    /// assignments, which always enable their blocks.
    pub fn enable_feature(&mut self, assignment: &FeatureAssignment) -> Result<(), BitstreamError> {
        let name = assignment.feature.as_str();
        if name.ends_with(RAM_INIT_SUFFIX) && self.db.get_feature(name).is_none() {
            let layout = self
                .geometry
                .ram
                .as_ref()
                .ok_or_else(|| BitstreamError::UnimplementedRam {
                    feature: name.to_string(),
                    span: assignment.origin,
                })?;
            return self.ram.populate(
                layout,
                name,
                &assignment.value,
                assignment.range,
                assignment.origin,
            );
        }

        if assignment.value.is_zero() {
            return Ok(());
        }

        match assignment.range {
            None => self.apply_feature(name, assignment.origin),
            Some(range) => {
                for index in range.start..=range.end {
                    if assignment.value.get(index - range.start) {
                        self.apply_feature(&format!("{name}[{index}]"), assignment.origin)?;
                    }
                }
                Ok(())
            }
        }
    }

    /// Sets a cell that no database feature names.
    ///
    /// Used for `{ unknown_bit = "wl_bl" }` annotations so that cells the
    /// disassembler could not attribute survive a round trip.
    pub fn restore_unknown_bit(&mut self, coord: Coord, origin: Span) -> Result<(), BitstreamError> {
        if !self.geometry.contains(coord) {
            return Err(BitstreamError::CoordinateOutOfRange {
                feature: format!("unknown_bit {coord}"),
                coord,
                span: origin,
            });
        }
        self.write(coord, true, origin);
        Ok(())
    }

    fn apply_feature(&mut self, name: &str, origin: Span) -> Result<(), BitstreamError> {
        let db = self.db;
        let feature = db
            .get_feature(name)
            .ok_or_else(|| BitstreamError::UnknownFeature {
                feature: name.to_string(),
                span: origin,
            })?;
        if let Some(bit) = feature.bits.iter().find(|b| !self.geometry.contains(b.coord)) {
            return Err(BitstreamError::CoordinateOutOfRange {
                feature: name.to_string(),
                coord: bit.coord,
                span: origin,
            });
        }
        for bit in &feature.bits {
            self.write(bit.coord, bit.set, origin);
        }
        Ok(())
    }

    fn write(&mut self, coord: Coord, value: bool, origin: Span) {
        let previous = self.store.set(coord, value, Some(origin));
        if let Some(prev) = previous {
            if let Some(prev_origin) = prev.origin {
                if prev.value != value && prev_origin != origin {
                    self.sink.emit(
                        Diagnostic::warning(
                            codes::CONFLICTING_ASSIGNMENT,
                            format!("conflicting assignment to cell {coord}"),
                            origin,
                        )
                        .with_label(Label::new(
                            prev_origin,
                            format!("previously set to {} here", prev.value as u8),
                        ))
                        .with_note(format!("the cell is now {}", value as u8)),
                    );
                }
            }
        }
    }

    /// Serializes the configuration into a bitstream.
    ///
    /// Layout: optional header, configuration words, RAM payload (families
    /// that carry RAM in the bitstream, when any block is enabled), optional
    /// Fletcher-32 trailer over everything after the preamble.
    pub fn produce(self, options: &BitstreamOptions) -> Result<ProducedBitstream, BitstreamError> {
        let geom = self.geometry;
        let checksum = geom.framing.checksum && options.checksum;
        let ram_payload = geom
            .ram
            .as_ref()
            .filter(|layout| layout.payload && self.ram.any_enabled());

        let header = if geom.framing.header {
            let mut mode = options.header;
            if ram_payload.is_some() && mode != HeaderMode::Full {
                self.sink.emit(
                    Diagnostic::warning(
                        codes::HEADER_PROMOTED,
                        "RAM blocks are initialized; writing a full header",
                        Span::SYNTHETIC,
                    )
                    .with_note("only the full header can describe enabled RAM blocks"),
                );
                mode = HeaderMode::Full;
            }
            let command = Command::from_options(options, checksum, ram_payload.is_some());
            let ram_enable = ram_payload
                .map(|layout| self.ram.enable_mask(layout))
                .unwrap_or(0);
            match mode {
                HeaderMode::None => None,
                HeaderMode::Short => Some(Header {
                    kind: HeaderKind::Short,
                    command,
                    ram_enable: 0,
                }),
                HeaderMode::Full => Some(Header {
                    kind: HeaderKind::Full,
                    command,
                    ram_enable,
                }),
            }
        } else {
            None
        };

        let mut data = Vec::with_capacity(geom.config_bytes() + 16);
        if let Some(h) = &header {
            data.extend_from_slice(&h.encode());
        }
        data.extend_from_slice(&encode_config_bits(geom, &self.store));
        if let Some(layout) = ram_payload {
            data.extend_from_slice(&self.ram.encode_payload(layout));
        }
        if checksum {
            let skip = header.map(|h| h.preamble_len()).unwrap_or(0);
            let sum = fletcher32(&data[skip..]);
            data.extend_from_slice(&sum.to_le_bytes());
        }

        Ok(ProducedBitstream {
            data,
            ram_mem: self.ram.mem_file(),
            header,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_width_saturates() {
        assert_eq!(BitRange { start: 0, end: 3 }.width(), 4);
        assert_eq!(BitRange { start: 0, end: u32::MAX }.width(), u32::MAX);
        assert_eq!(BitRange { start: 5, end: 2 }.width(), 1);
    }
    use crate::geometry::{Framing, EOS_S3, PP3};
    use crate::layout::decode_config_bits;
    use crate::test_support::MemoryDb;
    use qlf_source::FileId;

    fn line(n: u32) -> Span {
        Span::new(FileId::from_raw(0), n * 100, n * 100 + 10)
    }

    fn db() -> MemoryDb {
        MemoryDb::new()
            .with("X1Y1.A", &["5_5"])
            .with("X1Y1.B", &["5_6", "!5_5"])
            .with("X1Y1.INIT[0]", &["10_10"])
            .with("X1Y1.INIT[1]", &["10_11"])
            .with("X1Y1.INIT[2]", &["10_12"])
            .with("X1Y1.FAR", &["900_1"])
    }

    #[test]
    fn enable_writes_feature_bits() {
        let db = db();
        let sink = DiagnosticSink::new();
        let mut asm = Assembler::new(&EOS_S3, &db, &sink);
        asm.enable_feature(&FeatureAssignment::enable("X1Y1.A", line(1)))
            .unwrap();
        let bit = asm.store().get(Coord::new(5, 5)).unwrap();
        assert!(bit.value);
        assert_eq!(bit.origin, Some(line(1)));
    }

    #[test]
    fn zero_value_is_noop() {
        let db = db();
        let sink = DiagnosticSink::new();
        let mut asm = Assembler::new(&EOS_S3, &db, &sink);
        let mut a = FeatureAssignment::enable("X1Y1.A", line(1));
        a.value = BitValue::new(1);
        asm.enable_feature(&a).unwrap();
        assert!(asm.store().is_empty());
        // Even for names the database does not know.
        a.feature = "NOPE".into();
        asm.enable_feature(&a).unwrap();
    }

    #[test]
    fn ranged_value_enables_indexed_features() {
        let db = db();
        let sink = DiagnosticSink::new();
        let mut asm = Assembler::new(&EOS_S3, &db, &sink);
        asm.enable_feature(&FeatureAssignment {
            feature: "X1Y1.INIT".into(),
            value: BitValue::from_u64(0b101, 3),
            range: Some(BitRange { start: 0, end: 2 }),
            origin: line(1),
        })
        .unwrap();
        let set: Vec<_> = asm.store().set_coords().collect();
        assert_eq!(set, vec![Coord::new(10, 10), Coord::new(10, 12)]);
    }

    #[test]
    fn unknown_feature_is_fatal() {
        let db = db();
        let sink = DiagnosticSink::new();
        let mut asm = Assembler::new(&EOS_S3, &db, &sink);
        let err = asm
            .enable_feature(&FeatureAssignment::enable("X9Y9.NOPE", line(3)))
            .unwrap_err();
        assert_eq!(
            err,
            BitstreamError::UnknownFeature {
                feature: "X9Y9.NOPE".into(),
                span: line(3)
            }
        );
    }

    #[test]
    fn out_of_range_coordinate_is_fatal() {
        let db = db();
        let sink = DiagnosticSink::new();
        let mut asm = Assembler::new(&EOS_S3, &db, &sink);
        let err = asm
            .enable_feature(&FeatureAssignment::enable("X1Y1.FAR", line(2)))
            .unwrap_err();
        assert!(matches!(
            err,
            BitstreamError::CoordinateOutOfRange { coord, .. } if coord == Coord::new(900, 1)
        ));
        assert!(asm.store().is_empty());
        // PP3 has 884 wordlines.
        let mut asm = Assembler::new(&PP3, &db, &sink);
        assert!(asm
            .enable_feature(&FeatureAssignment::enable("X1Y1.FAR", line(2)))
            .is_err());
    }

    #[test]
    fn enabling_twice_is_idempotent() {
        let db = db();
        let sink = DiagnosticSink::new();
        let mut once = Assembler::new(&EOS_S3, &db, &sink);
        once.enable_feature(&FeatureAssignment::enable("X1Y1.B", line(1)))
            .unwrap();
        let mut twice = Assembler::new(&EOS_S3, &db, &sink);
        for _ in 0..2 {
            twice
                .enable_feature(&FeatureAssignment::enable("X1Y1.B", line(1)))
                .unwrap();
        }
        assert_eq!(once.store(), twice.store());
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn conflicting_lines_warn() {
        let db = db();
        let sink = DiagnosticSink::new();
        let mut asm = Assembler::new(&EOS_S3, &db, &sink);
        asm.enable_feature(&FeatureAssignment::enable("X1Y1.A", line(1)))
            .unwrap();
        asm.enable_feature(&FeatureAssignment::enable("X1Y1.B", line(2)))
            .unwrap();
        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::CONFLICTING_ASSIGNMENT);
        assert_eq!(diags[0].span, line(2));
        assert_eq!(diags[0].labels[0].span, line(1));
        assert!(!asm.store().value(Coord::new(5, 5)));
    }

    #[test]
    fn overriding_seed_does_not_warn() {
        let db = db();
        let sink = DiagnosticSink::new();
        let mut seed = ConfigBitStore::new();
        seed.set(Coord::new(5, 5), true, None);
        let mut asm = Assembler::with_seed(&EOS_S3, &db, &sink, seed);
        asm.enable_feature(&FeatureAssignment::enable("X1Y1.B", line(1)))
            .unwrap();
        assert!(sink.diagnostics().is_empty());
        assert!(!asm.store().value(Coord::new(5, 5)));
    }

    #[test]
    fn unknown_bit_restored() {
        let db = db();
        let sink = DiagnosticSink::new();
        let mut asm = Assembler::new(&EOS_S3, &db, &sink);
        asm.restore_unknown_bit(Coord::new(7, 8), line(1)).unwrap();
        assert!(asm.store().value(Coord::new(7, 8)));
        assert!(asm
            .restore_unknown_bit(Coord::new(7, 716), line(1))
            .is_err());
    }

    #[test]
    fn ram_init_on_ramless_device() {
        let no_ram = DeviceGeometry {
            ram: None,
            framing: Framing {
                header: false,
                checksum: false,
            },
            ..EOS_S3
        };
        let db = db();
        let sink = DiagnosticSink::new();
        let mut asm = Assembler::new(&no_ram, &db, &sink);
        let err = asm
            .enable_feature(&FeatureAssignment {
                feature: "X33Y2.RAM.RAM.INIT".into(),
                value: BitValue::new(9216),
                range: Some(BitRange {
                    start: 0,
                    end: 9215,
                }),
                origin: line(4),
            })
            .unwrap_err();
        assert!(matches!(err, BitstreamError::UnimplementedRam { span, .. } if span == line(4)));
    }

    #[test]
    fn produce_eos_s3_is_bare_words() {
        let db = db();
        let sink = DiagnosticSink::new();
        let mut asm = Assembler::new(&EOS_S3, &db, &sink);
        asm.enable_feature(&FeatureAssignment::enable("X1Y1.A", line(1)))
            .unwrap();
        let out = asm
            .produce(&BitstreamOptions {
                header: HeaderMode::Full,
                ..BitstreamOptions::default()
            })
            .unwrap();
        assert_eq!(out.data.len(), 75_960);
        assert!(out.header.is_none());
        assert!(out.ram_mem.is_none());
        let store = decode_config_bits(&EOS_S3, &out.data);
        assert!(store.value(Coord::new(5, 5)));
    }

    #[test]
    fn produce_eos_s3_ram_goes_to_side_file_only() {
        let db = db();
        let sink = DiagnosticSink::new();
        let mut asm = Assembler::new(&EOS_S3, &db, &sink);
        asm.enable_feature(&FeatureAssignment {
            feature: "X33Y2.RAM.RAM.INIT".into(),
            value: BitValue::from_u64(7, 9216),
            range: Some(BitRange {
                start: 0,
                end: 9215,
            }),
            origin: line(1),
        })
        .unwrap();
        let out = asm.produce(&BitstreamOptions::default()).unwrap();
        assert_eq!(out.data.len(), 75_960);
        let mem = out.ram_mem.unwrap();
        assert!(mem.starts_with("0x40018000:0x00000007\n"));
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn produce_pp3_short_header_and_checksum() {
        let db = db();
        let sink = DiagnosticSink::new();
        let asm = Assembler::new(&PP3, &db, &sink);
        let out = asm
            .produce(&BitstreamOptions {
                header: HeaderMode::Short,
                spi_master: true,
                ..BitstreamOptions::default()
            })
            .unwrap();
        assert_eq!(out.data.len(), 1 + 98_124 + 4);
        assert_eq!(out.data[0], Command::SPI_MASTER | Command::CHECKSUM_PRESENT);
        let body_end = out.data.len() - 4;
        let trailer = u32::from_le_bytes(out.data[body_end..].try_into().unwrap());
        assert_eq!(trailer, fletcher32(&out.data[..body_end]));
    }

    #[test]
    fn produce_pp3_ram_promotes_header() {
        let db = db();
        let sink = DiagnosticSink::new();
        let mut asm = Assembler::new(&PP3, &db, &sink);
        asm.enable_feature(&FeatureAssignment {
            feature: "X3Y17.RAM.RAM.INIT".into(),
            value: BitValue::new(18432),
            range: Some(BitRange {
                start: 0,
                end: 18431,
            }),
            origin: line(1),
        })
        .unwrap();
        let out = asm
            .produce(&BitstreamOptions {
                header: HeaderMode::Short,
                checksum: false,
                ..BitstreamOptions::default()
            })
            .unwrap();
        let header = out.header.unwrap();
        assert_eq!(header.kind, HeaderKind::Full);
        assert_eq!(header.ram_enable, 0b1100);
        assert!(header.command.contains(Command::RAM_PRESENT));
        assert_eq!(out.data.len(), 6 + 98_124 + 2 * 2048);
        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::HEADER_PROMOTED);
    }

    #[test]
    fn full_header_checksum_skips_preamble() {
        let db = db();
        let sink = DiagnosticSink::new();
        let asm = Assembler::new(&PP3, &db, &sink);
        let out = asm
            .produce(&BitstreamOptions {
                header: HeaderMode::Full,
                ..BitstreamOptions::default()
            })
            .unwrap();
        let end = out.data.len() - 4;
        let trailer = u32::from_le_bytes(out.data[end..].try_into().unwrap());
        assert_eq!(trailer, fletcher32(&out.data[1..end]));
    }
}
