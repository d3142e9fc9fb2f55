//! Report table of contents.
//!
//! Three parts: the fixed executive overview chapters, one entry per
//! specialist deep-dive, and the appendix. Numbering runs across all parts.

use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};
use tracing::{debug, instrument};

use auditbook_markdown::slugify;

use crate::audit::AgentReport;

/// Part I chapters, in report order.
pub const OVERVIEW_CHAPTERS: [&str; 5] = [
    "Executive Summary",
    "Score Breakdown",
    "Top Quick Wins",
    "Critical Issues",
    "90-Day Roadmap",
];

/// Part III chapters, in report order.
pub const APPENDIX_CHAPTERS: [&str; 3] =
    ["Quality Gate Results", "Competitive Position", "Audit Log"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocItem {
    pub number: usize,
    pub label: String,
    /// Fragment id without the `#`.
    pub anchor: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocSection {
    pub title: &'static str,
    pub items: Vec<TocItem>,
}

/// Anchor of a fixed chapter, the same slug the converter gives its heading.
pub fn chapter_anchor(label: &str) -> String {
    slugify(label)
}

/// Anchor of a specialist deep-dive chapter.
pub fn agent_anchor(name: &str) -> String {
    format!("agent-{name}")
}

#[instrument(level = "debug", skip_all, fields(agents = agents.len()))]
pub fn build_toc(agents: &[AgentReport]) -> Vec<TocSection> {
    let overview: Vec<TocItem> = OVERVIEW_CHAPTERS
        .iter()
        .enumerate()
        .map(|(i, label)| TocItem {
            number: i + 1,
            label: (*label).to_string(),
            anchor: chapter_anchor(label),
        })
        .collect();

    let first_agent = overview.len() + 1;
    let deep_dives: Vec<TocItem> = agents
        .iter()
        .enumerate()
        .map(|(i, agent)| TocItem {
            number: first_agent + i,
            label: match agent.score {
                Some(score) => format!("{} ({score})", agent.title),
                None => agent.title.clone(),
            },
            anchor: agent_anchor(&agent.name),
        })
        .collect();

    let first_appendix = first_agent + deep_dives.len();
    let appendix: Vec<TocItem> = APPENDIX_CHAPTERS
        .iter()
        .enumerate()
        .map(|(i, label)| TocItem {
            number: first_appendix + i,
            label: (*label).to_string(),
            anchor: chapter_anchor(label),
        })
        .collect();

    debug!(items = first_appendix + appendix.len() - 1, "TOC built");

    vec![
        TocSection {
            title: "Part I &mdash; Executive Overview",
            items: overview,
        },
        TocSection {
            title: "Part II &mdash; Specialist Deep-Dives",
            items: deep_dives,
        },
        TocSection {
            title: "Part III &mdash; Appendix",
            items: appendix,
        },
    ]
}

/// Render the TOC page. Section titles are trusted markup; labels are escaped.
pub fn render_toc(sections: &[TocSection]) -> String {
    let mut html = String::from("<div class=\"toc\">\n<h2>Table of Contents</h2>");
    for section in sections {
        html.push_str("\n<div class=\"toc-section\">");
        let _ = write!(
            html,
            "\n<div class=\"toc-section-title\">{}</div>",
            section.title
        );
        for item in &section.items {
            let _ = write!(
                html,
                "\n<a class=\"toc-item\" href=\"#{}\"><span class=\"toc-num\">{}</span>\
                 <span class=\"toc-label\">{}</span><span class=\"toc-dots\"></span></a>",
                encode_double_quoted_attribute(&item.anchor),
                item.number,
                encode_text(&item.label),
            );
        }
        html.push_str("\n</div>");
    }
    html.push_str("\n</div>");
    html
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
