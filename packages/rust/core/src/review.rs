//! Quality gate review parsing (`review/cmo-review.md`).
//!
//! The review is a markdown table with one row per specialist. Rows are
//! recognised loosely: any line mentioning PASS or FAIL with at least eight
//! non-empty cells.

use std::collections::BTreeMap;

use serde::Serialize;

use auditbook_shared::{ReviewEntry, Verdict};

/// Minimum non-empty cells for a line to count as a review row.
const MIN_ROW_CELLS: usize = 8;

/// Parse review rows keyed by the first cell (the agent name).
///
/// Later rows for the same agent replace earlier ones.
pub fn parse_review(text: &str) -> BTreeMap<String, ReviewEntry> {
    let mut entries = BTreeMap::new();

    for line in text.lines() {
        if !mentions_verdict(line) {
            continue;
        }
        let cells: Vec<&str> = line
            .split('|')
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .collect();
        if cells.len() < MIN_ROW_CELLS {
            continue;
        }

        let name = cells[0].to_string();
        let verdict = Verdict::from_text(cells[cells.len() - 1]);
        let total = parse_total(cells[cells.len() - 2]);
        entries.insert(name, ReviewEntry { verdict, total });
    }

    entries
}

/// Verdict for one agent: the last line mentioning its name or lowercased
/// title that also carries PASS or FAIL.
pub fn gate_for(review: &str, name: &str, title: &str) -> Option<Verdict> {
    let variants = [name.to_lowercase(), title.to_lowercase()];
    review
        .lines()
        .rev()
        .find(|line| {
            let lower = line.to_lowercase();
            mentions_verdict(line)
                && variants.iter().any(|v| !v.is_empty() && lower.contains(v.as_str()))
        })
        .map(Verdict::from_text)
}

/// PASS/FAIL counts over parsed review rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GateSummary {
    pub passed: usize,
    pub failed: usize,
}

impl GateSummary {
    pub fn from_entries(entries: &BTreeMap<String, ReviewEntry>) -> Self {
        entries
            .values()
            .fold(Self::default(), |mut acc, entry| {
                match entry.verdict {
                    Verdict::Pass => acc.passed += 1,
                    Verdict::Fail => acc.failed += 1,
                    Verdict::Unknown => {}
                }
                acc
            })
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    /// Pass rate in percent, `None` when no verdicts were recorded.
    pub fn pass_rate(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.passed as f64 / total as f64 * 100.0)
    }
}

fn mentions_verdict(line: &str) -> bool {
    line.contains("PASS") || line.contains("FAIL")
}

/// Leading integer of a `21/25` cell, 0 when unparsable.
fn parse_total(cell: &str) -> u32 {
    cell.split('/')
        .next()
        .and_then(|n| n.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REVIEW: &str = "\
# CMO Review

| Agent | Acc | Spec | Act | Evid | Prio | Total | Verdict |
|-------|-----|------|-----|------|------|-------|---------|
| seo-audit | 5 | 4 | 4 | 4 | 4 | 21/25 | PASS |
| email | 2 | 3 | 2 | 3 | 2 | 12/25 | FAIL |
| form-cro | 4 | 4 | 4 | 4 | 4 | ?/25 | PASS |
| short | PASS |

Seo Audit was re-run. Final: PASS.
";

    #[test]
    fn rows_with_enough_cells_are_parsed() {
        let entries = parse_review(REVIEW);
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries["seo-audit"],
            ReviewEntry {
                verdict: Verdict::Pass,
                total: 21
            }
        );
        assert_eq!(entries["email"].verdict, Verdict::Fail);
        assert_eq!(entries["email"].total, 12);
        assert_eq!(entries["form-cro"].total, 0);
        assert!(!entries.contains_key("short"));
    }

    #[test]
    fn header_row_without_verdict_word_is_skipped() {
        let entries = parse_review(REVIEW);
        assert!(!entries.contains_key("Agent"));
    }

    #[test]
    fn gate_uses_last_matching_line() {
        let review = "| email | FAIL |\nemail fixed, now PASS\nemail notes";
        assert_eq!(gate_for(review, "email", "Email"), Some(Verdict::Pass));
    }

    #[test]
    fn gate_matches_lowercased_title() {
        assert_eq!(
            gate_for(REVIEW, "seo-audit", "Seo Audit"),
            Some(Verdict::Pass)
        );
        assert_eq!(gate_for(REVIEW, "brand", "Brand"), None);
    }

    #[test]
    fn gate_summary_counts() {
        let summary = GateSummary::from_entries(&parse_review(REVIEW));
        assert_eq!(summary, GateSummary { passed: 2, failed: 1 });
        let rate = summary.pass_rate().unwrap();
        assert!((rate - 66.666).abs() < 0.01);
        assert_eq!(GateSummary::default().pass_rate(), None);
    }
}
