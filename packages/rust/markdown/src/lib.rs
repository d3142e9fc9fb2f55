//! Markdown-to-HTML conversion for audit reports.
//!
//! A single-pass, line-oriented converter for the markdown subset the
//! upstream reports use: ATX headings, paragraphs, flat lists, pipe tables,
//! fenced code and horizontal rules, with bold/italic/code/link inline
//! formatting.
//!
//! The converter never fails. Malformed input (an unterminated fence, a table
//! without a separator row, stray emphasis markers) degrades to the nearest
//! valid structure, and the output always has every element closed.

mod block;
mod inline;
mod slug;

use std::borrow::Cow;

use tracing::{debug, instrument};

pub use block::{BlockMode, BlockParser, ListKind};
pub use inline::{INLINE_PIPELINE, InlineStage, apply_stage, format_inline};
pub use slug::slugify;

/// Convert one markdown document to an HTML fragment.
///
/// `\r\n` and lone `\r` line endings are accepted. Empty or whitespace-only
/// input yields an empty string.
#[instrument(level = "debug", skip_all, fields(input_len = text.len()))]
pub fn convert(text: &str) -> String {
    let text = normalize_line_endings(text);

    let mut parser = BlockParser::new();
    for line in text.split('\n') {
        parser.push_line(line);
    }
    let html = parser.finish();

    debug!(output_len = html.len(), "markdown converted");
    html
}

fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
