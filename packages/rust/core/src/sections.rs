//! Level-2 section extraction from the synthesis report.

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

/// The boundary that ends a section: a newline, `##`, then whitespace.
/// `### Sub` headings do not match, so subsections stay in their parent.
static NEXT_SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n##\s").expect("section boundary regex"));

/// Return the section starting at the first `## <header>` (case-insensitive),
/// including its heading line, up to the next level-2 heading or end of text.
///
/// `header` is matched literally as a prefix of the heading text, so
/// `"Quick Wins"` finds `## Quick Wins (Week 1)`. Returns `None` when the
/// header is absent or the section is blank.
pub fn extract_section(markdown: &str, header: &str) -> Option<String> {
    let pattern = format!(r"##\s*{}", regex::escape(header));
    let re = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()?;

    let found = re.find(markdown)?;
    let rest = &markdown[found.end()..];
    let end = NEXT_SECTION_RE
        .find(rest)
        .map_or(markdown.len(), |m| found.end() + m.start());

    let section = markdown[found.start()..end].trim();
    (!section.is_empty()).then(|| section.to_string())
}

/// Try each header in order and return the first section found.
pub fn extract_first(markdown: &str, headers: &[&str]) -> Option<String> {
    headers
        .iter()
        .find_map(|header| extract_section(markdown, header))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "# Full Report\n\n\
        ## Executive Summary\n\nThe site is **solid**.\n\n\
        ### Highlights\n\n- fast\n\n\
        ## Score Breakdown\n\n| Area | Score |\n\n\
        ## Top 10 Quick Wins\n\n1. Fix titles\n";

    #[test]
    fn section_runs_to_next_level_two_heading() {
        let s = extract_section(REPORT, "Executive Summary").unwrap();
        assert!(s.starts_with("## Executive Summary"));
        assert!(s.contains("### Highlights"));
        assert!(s.ends_with("- fast"));
        assert!(!s.contains("Score Breakdown"));
    }

    #[test]
    fn last_section_runs_to_end() {
        let s = extract_section(REPORT, "Top 10 Quick Wins").unwrap();
        assert_eq!(s, "## Top 10 Quick Wins\n\n1. Fix titles");
    }

    #[test]
    fn match_is_case_insensitive() {
        assert!(extract_section(REPORT, "score breakdown").is_some());
    }

    #[test]
    fn header_is_matched_literally() {
        let md = "## 90-Day Roadmap (Q3)\n\nPlan.";
        assert!(extract_section(md, "90-Day Roadmap (Q3)").is_some());
        assert!(extract_section(md, "90.Day").is_none());
    }

    #[test]
    fn header_prefix_matches() {
        let md = "## Quick Wins (Week 1)\n\n- a";
        assert!(extract_section(md, "Quick Wins").unwrap().contains("- a"));
    }

    #[test]
    fn absent_section_is_none() {
        assert_eq!(extract_section(REPORT, "Competitive Position"), None);
        assert_eq!(extract_section("", "Anything"), None);
    }

    #[test]
    fn first_matching_header_wins() {
        let s = extract_first(REPORT, &["Roadmap", "Top 10 Quick Wins"]).unwrap();
        assert!(s.starts_with("## Top 10 Quick Wins"));
        assert!(extract_first(REPORT, &["Quick Wins"]).is_none());
        assert!(extract_first(REPORT, &["Roadmap", "Audit Log"]).is_none());
    }

    #[test]
    fn level_three_heading_also_matches() {
        // `##` followed by `#` matches one character in, like a substring search.
        let md = "intro\n### Critical Issues\n\n- broken\n## Next\n";
        let s = extract_section(md, "Critical Issues").unwrap();
        assert!(s.starts_with("## Critical Issues"));
        assert!(s.ends_with("- broken"));
    }
}
