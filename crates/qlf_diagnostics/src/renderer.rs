//! Human-readable diagnostic output.

use crate::diagnostic::Diagnostic;
use qlf_source::SourceDb;

/// Formats a diagnostic for output.
pub trait DiagnosticRenderer {
    /// Renders one diagnostic, including a trailing newline.
    fn render(&self, diag: &Diagnostic, sources: &SourceDb) -> String;
}

/// rustc-style terminal renderer.
///
/// ```text
/// warning[B203]: conflicting assignment to bit 5_5
///   --> top.fasm:7:1
///    |
///  7 | X1Y1.LOGIC.OFF
///    | ^^^^^^^^^^^^^^
///   ::: top.fasm:3:1 previously set here
///    = note: ...
/// ```
pub struct TerminalRenderer {
    /// Emit ANSI color escapes.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.color {
            format!("{style}{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, sources: &SourceDb) -> String {
        let mut out = String::new();
        let head = format!("{}[{}]", diag.severity, diag.code);
        out.push_str(&format!(
            "{}: {}\n",
            self.paint(diag.severity.ansi(), &head),
            diag.message
        ));

        if let Some(loc) = sources.resolve(diag.span) {
            let gutter = loc.line.to_string();
            let pad = " ".repeat(gutter.len());
            out.push_str(&format!("{pad}--> {loc}\n"));
            if let Some(text) = sources.line_of(diag.span) {
                let col = loc.col as usize - 1;
                let width = (diag.span.len() as usize)
                    .min(text.len().saturating_sub(col))
                    .max(1);
                let carets = self.paint(diag.severity.ansi(), &"^".repeat(width));
                out.push_str(&format!("{pad} |\n"));
                out.push_str(&format!("{gutter} | {text}\n"));
                out.push_str(&format!("{pad} | {}{carets}\n", " ".repeat(col)));
            }
        }

        for label in &diag.labels {
            match sources.resolve(label.span) {
                Some(loc) => out.push_str(&format!("  ::: {loc} {}\n", label.message)),
                None => out.push_str(&format!("  ::: {}\n", label.message)),
            }
        }
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }
        out
    }
}
