//! Render projection: runs → draw instructions
//!
//! Pure and toolkit-agnostic. The same runs over the same buffer always give
//! the same instructions, so the output can be snapshot-tested and painted by
//! any UI layer (DOM, canvas, terminal).

use serde::Serialize;

use crate::highlight::buffer::TextBuffer;
use crate::highlight::resolver::Run;
use crate::highlight::span::Span;

/// CSS class the browser extension gives every highlight.
pub const HIGHLIGHT_CLASS: &str = "biasbuster-highlight";

/// One paintable piece of text. `annotation` is `None` for plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawInstruction<'a> {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub annotation: Option<Vec<&'a Span>>,
    pub max_severity: Option<u8>,
}

impl<'a> DrawInstruction<'a> {
    pub fn is_plain(&self) -> bool {
        self.annotation.is_none()
    }

    /// Class list for an HTML painter, e.g. `"biasbuster-highlight severity-3"`.
    pub fn css_class(&self) -> Option<String> {
        self.max_severity
            .map(|severity| format!("{} severity-{}", HIGHLIGHT_CLASS, severity))
    }
}

/// Project `runs` (resolved against `buffer`) into draw instructions.
pub fn project<'a>(runs: &[Run<'a>], buffer: &TextBuffer) -> Vec<DrawInstruction<'a>> {
    runs.iter()
        .map(|run| {
            let annotation = if run.is_plain() {
                None
            } else {
                Some(run.spans.clone())
            };
            DrawInstruction {
                start: run.start,
                end: run.end,
                text: buffer.slice(run.start, run.end),
                annotation,
                max_severity: run.max_severity(),
            }
        })
        .collect()
}

/// Concatenated text of all instructions; equals the buffer for a full
/// partition.
pub fn rendered_text(instructions: &[DrawInstruction<'_>]) -> String {
    instructions.iter().map(|i| i.text.as_str()).collect()
}
