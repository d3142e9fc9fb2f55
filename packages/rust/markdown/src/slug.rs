//! Heading anchor slugs.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag regex"));

/// Derive an anchor slug from rendered heading text.
///
/// Inline markup is stripped and entities decoded before the text is
/// lowercased; every run of characters outside `[a-z0-9]` becomes a single
/// `-`, with none at either end. Repeated headings yield repeated slugs.
pub fn slugify(rendered: &str) -> String {
    let visible = TAG_RE.replace_all(rendered, "");
    let visible = html_escape::decode_html_entities(&visible).to_lowercase();

    let mut slug = String::with_capacity(visible.len());
    let mut gap = false;
    for c in visible.chars() {
        if c.is_ascii_alphanumeric() {
            if gap && !slug.is_empty() {
                slug.push('-');
            }
            gap = false;
            slug.push(c);
        } else {
            gap = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_collapses() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("90-Day Roadmap"), "90-day-roadmap");
        assert_eq!(slugify("  --Top 10 -- Quick Wins--  "), "top-10-quick-wins");
    }

    #[test]
    fn markup_is_stripped() {
        assert_eq!(
            slugify("<strong>Critical</strong> <em>Issues</em>"),
            "critical-issues"
        );
        assert_eq!(slugify("Use <code>a &amp; b</code>"), "use-a-b");
    }

    #[test]
    fn case_folded_text_gives_equal_slugs() {
        assert_eq!(slugify("Score Breakdown"), slugify("SCORE breakdown"));
    }

    #[test]
    fn non_ascii_treated_as_separator() {
        assert_eq!(slugify("Café Menü"), "caf-men");
        assert_eq!(slugify("!!!"), "");
    }
}
