//! Inline formatting pipeline.
//!
//! A line of already block-classified text goes through a fixed, ordered list
//! of substitution stages (see [`INLINE_PIPELINE`]). Every match a stage
//! produces is sealed into an opaque placeholder, so later stages can neither
//! reinterpret markers inside it nor open a span that straddles its edges.
//! The inner content of an emphasis or link match is first run through the
//! stages that come after it, which keeps nesting like `**a *b* c**` intact.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Placeholder delimiters (Unicode private use area).
const SEAL_OPEN: char = '\u{E000}';
const SEAL_CLOSE: char = '\u{E001}';

/// One substitution pass of the inline pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineStage {
    /// `` `code` `` → `<code>code</code>`, contents HTML-escaped.
    CodeSpan,
    /// `***text***` → `<strong><em>text</em></strong>`.
    BoldItalic,
    /// `**text**` → `<strong>text</strong>`.
    Bold,
    /// `*text*` → `<em>text</em>`.
    Italic,
    /// `[label](target)` → `<a href="target">label</a>`.
    Link,
}

/// Stage order. Code spans must run first so emphasis markers inside them stay
/// literal; triple asterisks must run before double, double before single.
pub const INLINE_PIPELINE: [InlineStage; 5] = [
    InlineStage::CodeSpan,
    InlineStage::BoldItalic,
    InlineStage::Bold,
    InlineStage::Italic,
    InlineStage::Link,
];

static CODE_SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("code span regex"));

static BOLD_ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\*(.+?)\*\*\*").expect("bold italic regex"));

static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold regex"));

static ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("italic regex"));

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link regex"));

static SEAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x{E000}(\d+)\x{E001}").expect("seal regex"));

impl InlineStage {
    fn pattern(self) -> &'static Regex {
        match self {
            Self::CodeSpan => &CODE_SPAN_RE,
            Self::BoldItalic => &BOLD_ITALIC_RE,
            Self::Bold => &BOLD_RE,
            Self::Italic => &ITALIC_RE,
            Self::Link => &LINK_RE,
        }
    }

    /// Run this stage over `text`. `rest` are the stages that follow it; they
    /// are applied to the inner content of each match before it is sealed.
    fn apply(self, text: &str, rest: &[InlineStage], seals: &mut Seals) -> String {
        self.pattern()
            .replace_all(text, |caps: &Captures| {
                let source = seals.source(&caps[0]);
                let html = match self {
                    Self::CodeSpan => {
                        let literal = seals.source(&caps[1]);
                        format!("<code>{}</code>", html_escape::encode_text(&literal))
                    }
                    Self::BoldItalic => {
                        let inner = run(&caps[1], rest, seals);
                        format!("<strong><em>{}</em></strong>", seals.html(&inner))
                    }
                    Self::Bold => {
                        let inner = run(&caps[1], rest, seals);
                        format!("<strong>{}</strong>", seals.html(&inner))
                    }
                    Self::Italic => {
                        let inner = run(&caps[1], rest, seals);
                        format!("<em>{}</em>", seals.html(&inner))
                    }
                    Self::Link => {
                        let label = run(&caps[1], rest, seals);
                        let target = seals.source(&caps[2]);
                        format!(
                            "<a href=\"{}\">{}</a>",
                            html_escape::encode_double_quoted_attribute(&target),
                            seals.html(&label)
                        )
                    }
                };
                seals.seal(html, source)
            })
            .into_owned()
    }
}

/// Apply inline formatting (code spans, bold, italic, links) to one line.
pub fn format_inline(text: &str) -> String {
    let mut seals = Seals::default();
    let protected = seals.protect(text);
    let out = run(&protected, &INLINE_PIPELINE, &mut seals);
    seals.html(&out)
}

/// Apply a single stage in isolation (no other stage runs, not even on inner
/// content).
pub fn apply_stage(stage: InlineStage, text: &str) -> String {
    let mut seals = Seals::default();
    let protected = seals.protect(text);
    let out = stage.apply(&protected, &[], &mut seals);
    seals.html(&out)
}

fn run(text: &str, stages: &[InlineStage], seals: &mut Seals) -> String {
    let mut current = text.to_string();
    for (i, stage) in stages.iter().enumerate() {
        current = stage.apply(&current, &stages[i + 1..], seals);
    }
    current
}

// ---------------------------------------------------------------------------
// Sealed fragments
// ---------------------------------------------------------------------------

/// A rendered span plus the markdown it was produced from.
#[derive(Debug)]
struct Fragment {
    html: String,
    source: String,
}

/// Store of sealed fragments for one `format_inline` call.
///
/// Fragment HTML is fully resolved when sealed, so expanding placeholders is
/// always a single pass.
#[derive(Debug, Default)]
struct Seals {
    fragments: Vec<Fragment>,
}

impl Seals {
    fn seal(&mut self, html: String, source: String) -> String {
        let id = self.fragments.len();
        self.fragments.push(Fragment { html, source });
        format!("{SEAL_OPEN}{id}{SEAL_CLOSE}")
    }

    /// Seal any literal delimiter characters already present in the input so
    /// they can never be mistaken for placeholders.
    fn protect(&mut self, text: &str) -> String {
        if !text.contains([SEAL_OPEN, SEAL_CLOSE]) {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if c == SEAL_OPEN || c == SEAL_CLOSE {
                let token = self.seal(c.to_string(), c.to_string());
                out.push_str(&token);
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Expand placeholders into rendered HTML.
    fn html(&self, text: &str) -> String {
        self.expand(text, |f| &f.html)
    }

    /// Expand placeholders back into the original markdown.
    fn source(&self, text: &str) -> String {
        self.expand(text, |f| &f.source)
    }

    fn expand(&self, text: &str, pick: impl Fn(&Fragment) -> &str) -> String {
        if !text.contains(SEAL_OPEN) {
            return text.to_string();
        }
        SEAL_RE
            .replace_all(text, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|id| self.fragments.get(id))
                    .map(|f| pick(f).to_string())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_untouched() {
        assert_eq!(format_inline("Just words, 100% plain."), "Just words, 100% plain.");
    }

    #[test]
    fn code_span_protects_emphasis() {
        let out = format_inline("`**not bold**`");
        assert_eq!(out, "<code>**not bold**</code>");
        assert!(!out.contains("<strong>"));
    }

    #[test]
    fn code_span_contents_escaped() {
        assert_eq!(format_inline("use `a < b && c`"), "use <code>a &lt; b &amp;&amp; c</code>");
    }

    #[test]
    fn bold_italic_nests_strong_em() {
        assert_eq!(format_inline("***both***"), "<strong><em>both</em></strong>");
    }

    #[test]
    fn adjacent_spans_wrapped_separately() {
        assert_eq!(
            format_inline("**a** and **b**"),
            "<strong>a</strong> and <strong>b</strong>"
        );
        assert_eq!(format_inline("*x* *y*"), "<em>x</em> <em>y</em>");
    }

    #[test]
    fn italic_inside_bold() {
        assert_eq!(
            format_inline("**a *b* c**"),
            "<strong>a <em>b</em> c</strong>"
        );
    }

    #[test]
    fn link_with_formatted_label() {
        assert_eq!(
            format_inline("[**Docs**](https://example.com)"),
            "<a href=\"https://example.com\"><strong>Docs</strong></a>"
        );
    }

    #[test]
    fn link_inside_bold() {
        assert_eq!(
            format_inline("**[x](/y)**"),
            "<strong><a href=\"/y\">x</a></strong>"
        );
    }

    #[test]
    fn link_target_keeps_raw_source() {
        assert_eq!(
            format_inline("[q](https://x.io/a*b*c?d=1&e=2)"),
            "<a href=\"https://x.io/a*b*c?d=1&amp;e=2\">q</a>"
        );
    }

    #[test]
    fn straddling_markers_do_not_overlap() {
        let out = format_inline("[**a](u)**");
        assert_eq!(out, "[<strong>a](u)</strong>");
        assert!(!out.contains("<a "));
    }

    #[test]
    fn unmatched_markers_stay_literal() {
        assert_eq!(format_inline("2 * 3 = 6"), "2 * 3 = 6");
        assert_eq!(format_inline("a `tick"), "a `tick");
        assert_eq!(format_inline("[label] (no link)"), "[label] (no link)");
    }

    #[test]
    fn literal_delimiter_chars_pass_through() {
        let input = "odd \u{E000}0\u{E001} text **b**";
        assert_eq!(
            format_inline(input),
            "odd \u{E000}0\u{E001} text <strong>b</strong>"
        );
    }

    #[test]
    fn single_stage_in_isolation() {
        // Bold alone does not touch single asterisks inside it.
        assert_eq!(
            apply_stage(InlineStage::Bold, "**a *b***"),
            "<strong>a *b</strong>*"
        );
        assert_eq!(apply_stage(InlineStage::Italic, "**x**"), "<em>*x</em>*");
        assert_eq!(apply_stage(InlineStage::Link, "`[a](b)`"), "`<a href=\"b\">a</a>`");
    }

    #[test]
    fn stage_order_is_fixed() {
        assert_eq!(
            INLINE_PIPELINE,
            [
                InlineStage::CodeSpan,
                InlineStage::BoldItalic,
                InlineStage::Bold,
                InlineStage::Italic,
                InlineStage::Link,
            ]
        );
    }
}
