//! Block-level state machine.
//!
//! [`BlockParser`] consumes one physical line at a time and keeps exactly one
//! [`BlockMode`]. Entering a new block closes whatever is open, and
//! [`BlockParser::finish`] closes the last one, so the emitted markup is
//! balanced no matter where the input stops.

use std::sync::LazyLock;

use regex::Regex;

use crate::inline::format_inline;
use crate::slug::slugify;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("heading regex"));

static UNORDERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*+]\s+(.+)$").expect("unordered item regex"));

static ORDERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s+(.+)$").expect("ordered item regex"));

const FENCE: &str = "```";

/// Which list element is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    Unordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Ordered => "ol",
            Self::Unordered => "ul",
        }
    }
}

/// The single open block context.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BlockMode {
    #[default]
    None,
    /// Inline-formatted lines waiting to be joined into one `<p>`.
    Paragraph { lines: Vec<String> },
    List(ListKind),
    /// Pipe table. The wrapper and `<thead>` are written together with the
    /// header row, so a table that never got one closes to nothing.
    Table { header_emitted: bool },
    /// Fenced code with the optional language tag and escaped body lines.
    Code {
        language: Option<String>,
        lines: Vec<String>,
    },
}

/// Line-at-a-time markdown block parser. One value per conversion.
#[derive(Debug, Default)]
pub struct BlockParser {
    mode: BlockMode,
    out: Vec<String>,
}

impl BlockParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current block context.
    pub fn mode(&self) -> &BlockMode {
        &self.mode
    }

    /// Feed one physical line (without its line terminator).
    pub fn push_line(&mut self, line: &str) {
        let trimmed = line.trim();

        if trimmed.starts_with(FENCE) {
            self.toggle_fence(trimmed);
            return;
        }

        if let BlockMode::Code { lines, .. } = &mut self.mode {
            lines.push(html_escape::encode_text(line).into_owned());
            return;
        }

        let in_table = matches!(self.mode, BlockMode::Table { .. });

        if !in_table && matches!(trimmed, "---" | "***" | "___") {
            self.close();
            self.out.push("<hr>".to_string());
            return;
        }

        if let Some(caps) = HEADING_RE.captures(trimmed) {
            self.close();
            let level = caps[1].len();
            let text = format_inline(&caps[2]);
            let slug = slugify(&text);
            self.out
                .push(format!("<h{level} id=\"{slug}\">{text}</h{level}>"));
            return;
        }

        if is_table_row(trimmed) {
            self.push_table_row(trimmed);
            return;
        }

        if in_table {
            self.close();
        }

        if let Some(caps) = UNORDERED_RE.captures(trimmed) {
            self.push_list_item(ListKind::Unordered, &caps[1]);
            return;
        }

        if let Some(caps) = ORDERED_RE.captures(trimmed) {
            self.push_list_item(ListKind::Ordered, &caps[1]);
            return;
        }

        if trimmed.is_empty() {
            // Only paragraphs end on a blank line; lists stay open.
            if matches!(self.mode, BlockMode::Paragraph { .. }) {
                self.close();
            }
            return;
        }

        if matches!(self.mode, BlockMode::List(_)) {
            self.close();
        }

        let fragment = format_inline(trimmed);
        if let BlockMode::Paragraph { lines } = &mut self.mode {
            lines.push(fragment);
        } else {
            self.mode = BlockMode::Paragraph {
                lines: vec![fragment],
            };
        }
    }

    /// End of input: close the open block and return the joined markup.
    pub fn finish(mut self) -> String {
        self.close();
        self.out.join("\n")
    }

    fn toggle_fence(&mut self, trimmed: &str) {
        if matches!(self.mode, BlockMode::Code { .. }) {
            self.close();
            return;
        }

        self.close();
        let language = trimmed[FENCE.len()..].trim();
        self.mode = BlockMode::Code {
            language: (!language.is_empty()).then(|| language.to_string()),
            lines: Vec::new(),
        };
    }

    fn push_list_item(&mut self, kind: ListKind, text: &str) {
        if self.mode != BlockMode::List(kind) {
            self.close();
            self.out.push(format!("<{}>", kind.tag()));
            self.mode = BlockMode::List(kind);
        }
        self.out.push(format!("<li>{}</li>", format_inline(text)));
    }

    fn push_table_row(&mut self, row: &str) {
        let header_emitted = if let BlockMode::Table { header_emitted } = self.mode {
            header_emitted
        } else {
            self.close();
            self.mode = BlockMode::Table {
                header_emitted: false,
            };
            false
        };

        let cells = split_cells(row);
        if is_separator(&cells) {
            return;
        }

        if header_emitted {
            let mut html = String::from("<tr>");
            for cell in &cells {
                html.push_str(&format!("<td>{}</td>", format_inline(cell)));
            }
            html.push_str("</tr>");
            self.out.push(html);
            return;
        }

        let mut html = String::from("<div class=\"table-wrapper\"><table>\n<thead><tr>");
        for cell in &cells {
            html.push_str(&format!("<th>{}</th>", format_inline(cell)));
        }
        html.push_str("</tr></thead>\n<tbody>");
        self.out.push(html);
        self.mode = BlockMode::Table {
            header_emitted: true,
        };
    }

    /// Emit the closing markup for the open block and return to `None`.
    fn close(&mut self) {
        match std::mem::take(&mut self.mode) {
            BlockMode::None => {}
            BlockMode::Paragraph { lines } => {
                if !lines.is_empty() {
                    self.out.push(format!("<p>{}</p>", lines.join(" ")));
                }
            }
            BlockMode::List(kind) => self.out.push(format!("</{}>", kind.tag())),
            BlockMode::Table { header_emitted } => {
                if header_emitted {
                    self.out.push("</tbody></table></div>".to_string());
                }
            }
            BlockMode::Code { language, lines } => {
                let class = language
                    .map(|lang| {
                        format!(
                            " class=\"language-{}\"",
                            html_escape::encode_double_quoted_attribute(&lang)
                        )
                    })
                    .unwrap_or_default();
                self.out
                    .push(format!("<pre><code{class}>{}</code></pre>", lines.join("\n")));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Table helpers
// ---------------------------------------------------------------------------

/// A pipe-led line with at least one more pipe.
fn is_table_row(trimmed: &str) -> bool {
    trimmed
        .strip_prefix('|')
        .is_some_and(|rest| rest.contains('|'))
}

/// Cells between the pipes. The slice before the leading pipe is always
/// dropped, the one after the last pipe only when it is empty.
fn split_cells(row: &str) -> Vec<&str> {
    let mut cells: Vec<&str> = row.split('|').skip(1).map(str::trim).collect();
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

/// `|---|:--:|` style row: every non-empty cell is dashes and colons.
fn is_separator(cells: &[&str]) -> bool {
    cells
        .iter()
        .filter(|c| !c.is_empty())
        .all(|c| c.chars().all(|ch| ch == '-' || ch == ':'))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lines: &[&str]) -> String {
        let mut parser = BlockParser::new();
        for line in lines {
            parser.push_line(line);
        }
        parser.finish()
    }

    // --- Transitions ---

    #[test]
    fn starts_in_none() {
        assert_eq!(BlockParser::new().mode(), &BlockMode::None);
    }

    #[test]
    fn text_opens_and_blank_closes_paragraph() {
        let mut p = BlockParser::new();
        p.push_line("Hello");
        assert_eq!(
            p.mode(),
            &BlockMode::Paragraph {
                lines: vec!["Hello".into()]
            }
        );
        p.push_line("   ");
        assert_eq!(p.mode(), &BlockMode::None);
        assert_eq!(p.finish(), "<p>Hello</p>");
    }

    #[test]
    fn list_survives_blank_line() {
        let mut p = BlockParser::new();
        p.push_line("- one");
        p.push_line("");
        assert_eq!(p.mode(), &BlockMode::List(ListKind::Unordered));
        p.push_line("- two");
        assert_eq!(p.finish(), "<ul>\n<li>one</li>\n<li>two</li>\n</ul>");
    }

    #[test]
    fn text_after_list_closes_it() {
        let out = run(&["1. first", "after"]);
        assert_eq!(out, "<ol>\n<li>first</li>\n</ol>\n<p>after</p>");
    }

    #[test]
    fn heading_closes_list() {
        let out = run(&["- a", "## Next"]);
        assert_eq!(out, "<ul>\n<li>a</li>\n</ul>\n<h2 id=\"next\">Next</h2>");
    }

    #[test]
    fn table_row_closes_list() {
        let out = run(&["- a", "| A |", "| 1 |"]);
        assert!(out.starts_with("<ul>\n<li>a</li>\n</ul>\n<div class=\"table-wrapper\"><table>"));
        assert!(out.contains("<tr><td>1</td></tr>"));
    }

    #[test]
    fn fence_closes_list() {
        let out = run(&["- a", "```", "code", "```"]);
        assert_eq!(out, "<ul>\n<li>a</li>\n</ul>\n<pre><code>code</code></pre>");
    }

    #[test]
    fn list_item_flushes_paragraph() {
        let out = run(&["intro", "+ item"]);
        assert_eq!(out, "<p>intro</p>\n<ul>\n<li>item</li>\n</ul>");
    }

    #[test]
    fn fence_opens_code_with_language() {
        let mut p = BlockParser::new();
        p.push_line("text");
        p.push_line("```rust");
        assert_eq!(
            p.mode(),
            &BlockMode::Code {
                language: Some("rust".into()),
                lines: vec![]
            }
        );
        p.push_line("let x = a < b;");
        p.push_line("```");
        assert_eq!(p.mode(), &BlockMode::None);
        assert_eq!(
            p.finish(),
            "<p>text</p>\n<pre><code class=\"language-rust\">let x = a &lt; b;</code></pre>"
        );
    }

    #[test]
    fn code_lines_are_verbatim() {
        let out = run(&["```", "  # not a heading", "- **not a list**", "| a | b |", "```"]);
        assert_eq!(
            out,
            "<pre><code>  # not a heading\n- **not a list**\n| a | b |</code></pre>"
        );
    }

    #[test]
    fn table_header_then_body() {
        let mut p = BlockParser::new();
        p.push_line("| A | B |");
        assert_eq!(
            p.mode(),
            &BlockMode::Table {
                header_emitted: true
            }
        );
        p.push_line("|---|:-:|");
        p.push_line("| 1 | **2** |");
        p.push_line("");
        assert_eq!(p.mode(), &BlockMode::None);
        assert_eq!(
            p.finish(),
            "<div class=\"table-wrapper\"><table>\n<thead><tr><th>A</th><th>B</th></tr></thead>\n<tbody>\n\
             <tr><td>1</td><td><strong>2</strong></td></tr>\n</tbody></table></div>"
        );
    }

    #[test]
    fn leading_separator_waits_for_header() {
        let mut p = BlockParser::new();
        p.push_line("|---|---|");
        assert_eq!(
            p.mode(),
            &BlockMode::Table {
                header_emitted: false
            }
        );
        p.push_line("| H | I |");
        let out = p.finish();
        assert!(out.contains("<th>H</th><th>I</th>"));
        assert!(out.ends_with("</tbody></table></div>"));
    }

    #[test]
    fn separator_only_table_emits_nothing() {
        assert_eq!(run(&["|---|", "after"]), "<p>after</p>");
    }

    #[test]
    fn missing_separator_still_a_table() {
        let out = run(&["| A | B |", "| 1 | 2 |"]);
        assert!(out.contains("<th>A</th>"));
        assert!(out.contains("<tr><td>1</td><td>2</td></tr>"));
    }

    #[test]
    fn non_row_line_closes_table() {
        let out = run(&["| A |", "| 1 |", "Not | a row"]);
        assert!(out.ends_with("</tbody></table></div>\n<p>Not | a row</p>"));
    }

    #[test]
    fn rule_inside_table_is_text() {
        let out = run(&["| A |", "---"]);
        assert!(out.ends_with("</tbody></table></div>\n<p>---</p>"));
    }

    #[test]
    fn heading_closes_table() {
        let out = run(&["| A |", "## Next"]);
        assert!(out.ends_with("</tbody></table></div>\n<h2 id=\"next\">Next</h2>"));
    }

    #[test]
    fn heading_levels_and_slugs() {
        assert_eq!(
            run(&["# Title", "###### Deep *dive*"]),
            "<h1 id=\"title\">Title</h1>\n<h6 id=\"deep-dive\">Deep <em>dive</em></h6>"
        );
    }

    #[test]
    fn seven_hashes_is_paragraph() {
        assert_eq!(run(&["####### too deep"]), "<p>####### too deep</p>");
    }

    #[test]
    fn hash_without_space_is_paragraph() {
        assert_eq!(run(&["#hashtag"]), "<p>#hashtag</p>");
    }

    #[test]
    fn rules_close_paragraph() {
        assert_eq!(run(&["a", "***", "b", "___"]), "<p>a</p>\n<hr>\n<p>b</p>\n<hr>");
    }

    #[test]
    fn pipe_without_second_pipe_is_text() {
        assert_eq!(run(&["| lonely"]), "<p>| lonely</p>");
    }

    #[test]
    fn trailing_cell_without_pipe_kept() {
        assert_eq!(split_cells("| a | b"), vec!["a", "b"]);
        assert_eq!(split_cells("|a|b|"), vec!["a", "b"]);
        assert_eq!(split_cells("| a | | c |"), vec!["a", "", "c"]);
    }

    #[test]
    fn separator_detection() {
        assert!(is_separator(&["---", ":--:", "--:"]));
        assert!(is_separator(&["---", ""]));
        assert!(!is_separator(&["---", "x"]));
    }

    // --- End of input ---

    #[test]
    fn finish_closes_every_mode() {
        assert_eq!(run(&["para"]), "<p>para</p>");
        assert_eq!(run(&["- item"]), "<ul>\n<li>item</li>\n</ul>");
        assert!(run(&["| a | b |"]).ends_with("</tbody></table></div>"));
        assert_eq!(run(&["```sh", "echo hi"]), "<pre><code class=\"language-sh\">echo hi</code></pre>");
        assert_eq!(run(&[]), "");
    }
}
