//! Secondary source locations attached to a diagnostic.

use qlf_source::Span;
use serde::{Deserialize, Serialize};

/// A secondary span with a short message, e.g. "previously set here".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Annotated span.
    pub span: Span,
    /// Text shown next to the location.
    pub message: String,
}

impl Label {
    /// Creates a label.
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}
