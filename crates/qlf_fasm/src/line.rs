//! The parsed form of one FASM line.

use qlf_bitstream::{BitRange, FeatureAssignment};
use qlf_common::{BitValue, Coord};
use qlf_source::Span;
use std::fmt::Write;

/// Annotation key that carries a set cell no feature explains.
pub const UNKNOWN_BIT: &str = "unknown_bit";

/// A `key = "value"` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Annotation name.
    pub name: String,
    /// Annotation value, without quotes.
    pub value: String,
}

/// One FASM line. Every part is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FasmLine {
    /// Feature name without the range.
    pub feature: Option<String>,
    /// Bit range, `[hi]` or `[hi:lo]`.
    pub range: Option<BitRange>,
    /// Explicit value after `=`.
    pub value: Option<BitValue>,
    /// Annotations in source order.
    pub annotations: Vec<Annotation>,
    /// Comment text after `#`, without the marker.
    pub comment: Option<String>,
    /// Span of the whole line.
    pub span: Span,
}

impl FasmLine {
    /// A line holding nothing.
    pub fn empty(span: Span) -> Self {
        Self {
            feature: None,
            range: None,
            value: None,
            annotations: Vec::new(),
            comment: None,
            span,
        }
    }

    /// A bare feature line.
    pub fn feature(name: impl Into<String>) -> Self {
        Self {
            feature: Some(name.into()),
            ..Self::empty(Span::SYNTHETIC)
        }
    }

    /// An annotation-only line marking a set cell no feature explains.
    pub fn unknown_bit(coord: Coord) -> Self {
        Self::empty(Span::SYNTHETIC).with_annotation(UNKNOWN_BIT, coord.to_string())
    }

    /// The line equivalent of an assignment.
    pub fn from_assignment(assignment: &FeatureAssignment) -> Self {
        Self {
            feature: Some(assignment.feature.clone()),
            range: assignment.range,
            value: Some(assignment.value.clone()),
            ..Self::empty(assignment.origin)
        }
    }

    /// Adds an annotation.
    pub fn with_annotation(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.push(Annotation {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Returns true if the line holds no feature and no annotation.
    pub fn is_blank(&self) -> bool {
        self.feature.is_none() && self.annotations.is_empty()
    }

    /// The feature assignment this line makes, if it names a feature.
    ///
    /// A line without `= VALUE` assigns 1. The value is sized to the range
    /// width (1 without a range).
    pub fn assignment(&self) -> Option<FeatureAssignment> {
        let feature = self.feature.as_ref()?;
        let width = self.range.map_or(1, |r| r.width());
        let value = self
            .value
            .as_ref()
            .map_or_else(|| BitValue::from_u64(1, width), |v| v.resized(width));
        Some(FeatureAssignment {
            feature: feature.clone(),
            value,
            range: self.range,
            origin: self.span,
        })
    }

    /// Coordinates carried by `unknown_bit` annotations.
    ///
    /// The parser rejects lines with malformed coordinates, so every
    /// annotation of a parsed line yields one.
    pub fn unknown_bits(&self) -> impl Iterator<Item = Coord> + '_ {
        self.annotations
            .iter()
            .filter(|a| a.name == UNKNOWN_BIT)
            .filter_map(|a| a.value.parse().ok())
    }

    /// Formats the line as FASM text, without a line terminator.
    pub fn to_fasm_line(&self) -> String {
        let mut out = String::new();
        if let Some(feature) = &self.feature {
            out.push_str(feature);
            match self.range {
                Some(r) if r.start == r.end => {
                    let _ = write!(out, "[{}]", r.end);
                }
                Some(r) => {
                    let _ = write!(out, "[{}:{}]", r.end, r.start);
                }
                None => {}
            }
            if let Some(value) = &self.value {
                let _ = write!(out, " = {value}");
            }
        }
        if !self.annotations.is_empty() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str("{ ");
            for (i, a) in self.annotations.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{} = \"{}\"", a.name, a.value.replace('"', "\\\""));
            }
            out.push_str(" }");
        }
        if let Some(comment) = &self.comment {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "#{comment}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_feature() {
        assert_eq!(FasmLine::feature("X1Y1.A").to_fasm_line(), "X1Y1.A");
    }

    #[test]
    fn unknown_bit_line() {
        let line = FasmLine::unknown_bit(Coord::new(7, 8));
        assert_eq!(line.to_fasm_line(), "{ unknown_bit = \"7_8\" }");
        assert_eq!(line.unknown_bits().collect::<Vec<_>>(), vec![Coord::new(7, 8)]);
        assert!(line.assignment().is_none());
    }

    #[test]
    fn ranged_value() {
        let line = FasmLine {
            range: Some(BitRange { start: 0, end: 3 }),
            value: Some(BitValue::from_u64(0xA, 4)),
            ..FasmLine::feature("X1Y1.INIT")
        };
        assert_eq!(line.to_fasm_line(), "X1Y1.INIT[3:0] = 4'ha");
    }

    #[test]
    fn single_index_range() {
        let line = FasmLine {
            range: Some(BitRange { start: 5, end: 5 }),
            ..FasmLine::feature("X1Y1.INIT")
        };
        assert_eq!(line.to_fasm_line(), "X1Y1.INIT[5]");
    }

    #[test]
    fn annotations_and_comment() {
        let mut line = FasmLine::feature("A").with_annotation("k", "v").with_annotation("x", "y");
        line.comment = Some(" note".into());
        assert_eq!(line.to_fasm_line(), "A { k = \"v\", x = \"y\" } # note");
    }

    #[test]
    fn assignment_defaults_to_one() {
        let a = FasmLine::feature("A").assignment().unwrap();
        assert_eq!(a.value, BitValue::from_u64(1, 1));
        assert_eq!(a.range, None);
    }

    #[test]
    fn assignment_sized_to_range() {
        let line = FasmLine {
            range: Some(BitRange { start: 4, end: 11 }),
            value: Some(BitValue::from_u64(3, 2)),
            ..FasmLine::feature("A")
        };
        let a = line.assignment().unwrap();
        assert_eq!(a.value.width(), 8);
        assert_eq!(a.value.to_u64(), Some(3));
    }

    #[test]
    fn from_assignment_roundtrip() {
        let a = FeatureAssignment {
            feature: "X3Y1.RAM.RAM.INIT".into(),
            value: BitValue::from_u64(1, 9216),
            range: Some(BitRange {
                start: 0,
                end: 9215,
            }),
            origin: Span::SYNTHETIC,
        };
        let line = FasmLine::from_assignment(&a);
        assert_eq!(line.assignment().unwrap(), a);
        assert!(line.to_fasm_line().starts_with("X3Y1.RAM.RAM.INIT[9215:0] = 9216'h0"));
    }

    #[test]
    fn blank() {
        assert!(FasmLine::empty(Span::SYNTHETIC).is_blank());
        assert!(!FasmLine::feature("A").is_blank());
    }
}
