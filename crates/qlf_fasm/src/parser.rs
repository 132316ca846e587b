//! Line-oriented FASM parser with per-line error recovery.
//!
//! Each line is parsed on its own. A line that fails to parse is reported to
//! the [`DiagnosticSink`] with the span of the offending token and skipped,
//! so one run reports every bad line at once.

use crate::codes;
use crate::line::{Annotation, FasmLine, UNKNOWN_BIT};
use crate::value::{parse_value, MAX_VALUE_WIDTH};
use qlf_bitstream::BitRange;
use qlf_common::Coord;
use qlf_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use qlf_source::{FileId, SourceDb, Span};

/// Parses every line of a loaded FASM file.
///
/// Blank and comment-only lines are dropped. Lines with errors are reported
/// to `sink` and dropped.
pub fn parse_fasm(sources: &SourceDb, file: FileId, sink: &DiagnosticSink) -> Vec<FasmLine> {
    sources
        .lines(file)
        .filter_map(|line| match parse_line(line.text, line.span) {
            Ok(parsed) => Some(parsed),
            Err(diag) => {
                sink.emit(diag);
                None
            }
        })
        .filter(|line| !line.is_blank())
        .collect()
}

/// Parses a single line whose text starts at `span.start`.
///
/// # Errors
///
/// Returns an error diagnostic pointing at the offending token.
pub fn parse_line(text: &str, span: Span) -> Result<FasmLine, Diagnostic> {
    LineParser {
        text,
        bytes: text.as_bytes(),
        pos: 0,
        span,
    }
    .parse()
}

struct LineParser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    span: Span,
}

impl LineParser<'_> {
    fn parse(mut self) -> Result<FasmLine, Diagnostic> {
        let mut line = FasmLine::empty(self.span);

        self.skip_whitespace();
        if !matches!(self.peek(), 0 | b'{' | b'#') {
            self.parse_feature(&mut line)?;
        }

        self.skip_whitespace();
        if self.peek() == b'{' {
            let start = self.pos;
            line.annotations = self.parse_annotations()?;
            self.check_unknown_bits(&line.annotations, start)?;
        }

        self.skip_whitespace();
        if self.peek() == b'#' {
            line.comment = Some(self.text[self.pos + 1..].to_string());
            self.pos = self.bytes.len();
        }

        if self.pos < self.bytes.len() {
            return Err(self.error(
                codes::MALFORMED_LINE,
                format!("unexpected '{}'", self.text[self.pos..].trim_end()),
                self.pos,
                self.bytes.len(),
            ));
        }
        Ok(line)
    }

    fn parse_feature(&mut self, line: &mut FasmLine) -> Result<(), Diagnostic> {
        let start = self.pos;
        while !matches!(self.peek(), 0 | b'[' | b'=' | b'{' | b'#') && !self.at_whitespace() {
            self.pos += 1;
        }
        let name = &self.text[start..self.pos];
        if name.is_empty() || name.split('.').any(str::is_empty) {
            return Err(self.error(
                codes::MALFORMED_LINE,
                format!("invalid feature name '{name}'"),
                start,
                self.pos.max(start + 1),
            ));
        }
        line.feature = Some(name.to_string());

        if self.peek() == b'[' {
            line.range = Some(self.parse_range()?);
        }

        self.skip_whitespace();
        if self.peek() != b'=' {
            return Ok(());
        }
        self.pos += 1;
        self.skip_whitespace();

        let value_start = self.pos;
        while !matches!(self.peek(), 0 | b'{' | b'#') && !self.at_whitespace() {
            self.pos += 1;
        }
        let literal = &self.text[value_start..self.pos];
        if literal.is_empty() {
            return Err(self.error(
                codes::INVALID_VALUE,
                "missing value after '='",
                value_start,
                value_start,
            ));
        }
        let value = parse_value(literal)
            .map_err(|msg| self.error(codes::INVALID_VALUE, msg, value_start, self.pos))?;

        let width = line.range.map_or(1, |r| r.width());
        if value.significant_bits() > width {
            return Err(self
                .error(
                    codes::VALUE_TOO_WIDE,
                    format!("value '{literal}' does not fit in {width} bit(s) of '{name}'"),
                    value_start,
                    self.pos,
                )
                .with_help("widen the bit range or drop the extra high bits"));
        }
        line.value = Some(value);
        Ok(())
    }

    fn parse_range(&mut self) -> Result<BitRange, Diagnostic> {
        let start = self.pos;
        self.pos += 1;
        let hi = self.index(start)?;
        let lo = if self.peek() == b':' {
            self.pos += 1;
            self.index(start)?
        } else {
            hi
        };
        if self.peek() != b']' {
            return Err(self.error(codes::INVALID_RANGE, "expected ']'", start, self.pos));
        }
        self.pos += 1;
        if lo > hi {
            return Err(self.error(
                codes::INVALID_RANGE,
                format!("bit range [{hi}:{lo}] is reversed"),
                start,
                self.pos,
            ));
        }
        if hi - lo >= MAX_VALUE_WIDTH {
            return Err(self.error(
                codes::INVALID_RANGE,
                format!("bit range [{hi}:{lo}] is wider than {MAX_VALUE_WIDTH} bits"),
                start,
                self.pos,
            ));
        }
        Ok(BitRange { start: lo, end: hi })
    }

    fn index(&mut self, range_start: usize) -> Result<u32, Diagnostic> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_ascii_digit() {
            self.pos += 1;
        }
        let index = self.text[start..self.pos].parse::<u32>().map_err(|_| {
            self.error(
                codes::INVALID_RANGE,
                "expected a bit index",
                range_start,
                self.pos.max(start + 1),
            )
        })?;
        self.skip_whitespace();
        Ok(index)
    }

    fn parse_annotations(&mut self) -> Result<Vec<Annotation>, Diagnostic> {
        let block_start = self.pos;
        let unterminated = |p: &Self| {
            p.error(
                codes::MALFORMED_ANNOTATION,
                "unterminated annotation block",
                block_start,
                p.bytes.len(),
            )
        };
        self.pos += 1;

        let mut annotations = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                0 => return Err(unterminated(self)),
                b'}' => {
                    self.pos += 1;
                    return Ok(annotations);
                }
                _ => {}
            }

            let name_start = self.pos;
            while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
                self.pos += 1;
            }
            if self.pos == name_start {
                return Err(self.error(
                    codes::MALFORMED_ANNOTATION,
                    "expected annotation name",
                    name_start,
                    name_start + 1,
                ));
            }
            let name = self.text[name_start..self.pos].to_string();

            self.skip_whitespace();
            self.expect(b'=', "expected '=' after annotation name")?;
            self.skip_whitespace();
            self.expect(b'"', "expected quoted annotation value")?;

            let mut value = Vec::new();
            loop {
                match self.peek() {
                    0 => return Err(unterminated(self)),
                    b'"' => {
                        self.pos += 1;
                        break;
                    }
                    b'\\' if self.pos + 1 < self.bytes.len() => {
                        value.push(self.bytes[self.pos + 1]);
                        self.pos += 2;
                    }
                    b => {
                        value.push(b);
                        self.pos += 1;
                    }
                }
            }
            annotations.push(Annotation {
                name,
                value: String::from_utf8_lossy(&value).into_owned(),
            });

            self.skip_whitespace();
            match self.peek() {
                b',' => self.pos += 1,
                b'}' => {}
                0 => return Err(unterminated(self)),
                _ => {
                    return Err(self.error(
                        codes::MALFORMED_ANNOTATION,
                        "expected ',' or '}'",
                        self.pos,
                        self.pos + 1,
                    ))
                }
            }
        }
    }

    fn check_unknown_bits(&self, annotations: &[Annotation], start: usize) -> Result<(), Diagnostic> {
        for a in annotations.iter().filter(|a| a.name == UNKNOWN_BIT) {
            if let Err(err) = a.value.parse::<Coord>() {
                return Err(self.error(codes::INVALID_UNKNOWN_BIT, err.to_string(), start, self.pos));
            }
        }
        Ok(())
    }

    fn expect(&mut self, byte: u8, message: &str) -> Result<(), Diagnostic> {
        if self.peek() == byte {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(codes::MALFORMED_ANNOTATION, message, self.pos, self.pos + 1))
        }
    }

    fn peek(&self) -> u8 {
        self.bytes.get(self.pos).copied().unwrap_or(0)
    }

    fn at_whitespace(&self) -> bool {
        self.peek().is_ascii_whitespace()
    }

    fn skip_whitespace(&mut self) {
        while self.at_whitespace() {
            self.pos += 1;
        }
    }

    fn error(
        &self,
        code: DiagnosticCode,
        message: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Diagnostic {
        let end = end.max(start);
        Diagnostic::error(code, message, self.span.sub(start, end - start))
    }
}
