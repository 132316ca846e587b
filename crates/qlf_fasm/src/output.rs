//! FASM text emitter.

use crate::line::FasmLine;
use qlf_bitstream::{Disassembly, FeatureAssignment};
use qlf_common::Coord;
use std::fmt::Write;

/// A sequence of FASM lines forming one configuration.
#[derive(Debug, Clone, Default)]
pub struct FasmOutput {
    lines: Vec<FasmLine>,
}

impl FasmOutput {
    /// Creates an empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the output for a disassembly: matched features in database
    /// order, then one `unknown_bit` line per unexplained cell.
    pub fn from_disassembly(disassembly: &Disassembly) -> Self {
        let mut out = Self::new();
        for feature in &disassembly.features {
            out.add_feature(feature);
        }
        for &coord in &disassembly.unknown_bits {
            out.add_unknown_bit(coord);
        }
        out
    }

    /// Adds a bare feature line.
    pub fn add_feature(&mut self, feature: &str) {
        self.lines.push(FasmLine::feature(feature));
    }

    /// Adds an `unknown_bit` annotation line.
    pub fn add_unknown_bit(&mut self, coord: Coord) {
        self.lines.push(FasmLine::unknown_bit(coord));
    }

    /// Adds a line for a feature assignment, keeping its range and value.
    pub fn add_assignment(&mut self, assignment: &FeatureAssignment) {
        self.lines.push(FasmLine::from_assignment(assignment));
    }

    /// Adds a pre-built line.
    pub fn add(&mut self, line: FasmLine) {
        self.lines.push(line);
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns whether no lines have been added.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The lines, in insertion order.
    pub fn lines(&self) -> &[FasmLine] {
        &self.lines
    }

    /// Renders all lines in insertion order, each terminated by a newline.
    pub fn render(&self) -> String {
        let mut output = String::new();
        for line in &self.lines {
            let _ = writeln!(output, "{}", line.to_fasm_line());
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_fasm;
    use qlf_bitstream::BitRange;
    use qlf_common::BitValue;
    use qlf_diagnostics::DiagnosticSink;
    use qlf_source::{SourceDb, Span};

    #[test]
    fn empty_output() {
        let out = FasmOutput::new();
        assert!(out.is_empty());
        assert_eq!(out.render(), "");
    }

    #[test]
    fn disassembly_rendering_matches() {
        let d = Disassembly {
            features: vec!["X1Y1.A".into(), "X2Y2.B".into()],
            unknown_bits: vec![Coord::new(7, 8), Coord::new(9, 1)],
        };
        let out = FasmOutput::from_disassembly(&d);
        assert_eq!(out.len(), 4);
        assert_eq!(
            out.render(),
            "X1Y1.A\nX2Y2.B\n{ unknown_bit = \"7_8\" }\n{ unknown_bit = \"9_1\" }\n"
        );
    }

    #[test]
    fn insertion_order_kept() {
        let mut out = FasmOutput::new();
        out.add_feature("Z");
        out.add_feature("A");
        assert_eq!(out.render(), "Z\nA\n");
    }

    #[test]
    fn rendered_text_parses_back() {
        let mut out = FasmOutput::new();
        out.add_feature("X1Y1.A");
        out.add_assignment(&FeatureAssignment {
            feature: "X1Y1.INIT".into(),
            value: BitValue::from_u64(0x5, 4),
            range: Some(BitRange { start: 0, end: 3 }),
            origin: Span::SYNTHETIC,
        });
        out.add_unknown_bit(Coord::new(3, 4));

        let mut sources = SourceDb::new();
        let file = sources.add_source("out.fasm", out.render());
        let sink = DiagnosticSink::new();
        let lines = parse_fasm(&sources, file, &sink);
        assert!(!sink.has_errors());
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].value.as_ref().and_then(|v| v.to_u64()), Some(5));
        assert_eq!(lines[2].unknown_bits().next(), Some(Coord::new(3, 4)));
    }
}
