//! HTML report assembler.
//!
//! Turns a loaded [`Audit`] into one self-contained HTML document: cover
//! page, methodology note, table of contents, then one chapter per
//! synthesis section and specialist report. Every chapter body goes through
//! the markdown converter; sections missing from the synthesis report fall
//! back to content built from the agent data.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{Local, NaiveDate};
use html_escape::{encode_double_quoted_attribute, encode_text};
use tracing::{debug, info, instrument};

use auditbook_markdown::convert;
use auditbook_shared::{
    AuditBookError, Grade, ModelTier, ModelsConfig, ReportConfig, Result, Verdict,
};

use crate::audit::{AgentReport, Audit};
use crate::review::gate_for;
use crate::sections::extract_first;
use crate::toc::{agent_anchor, build_toc, chapter_anchor, render_toc};

/// Print stylesheet embedded in every report.
pub const STYLESHEET: &str = include_str!("../assets/report.css");

/// Appendix used when the synthesis report has no scoring section.
const SCORING_METHODOLOGY: &str = include_str!("../assets/scoring-methodology.md");

/// Options that shape the document but not its content.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Cover heading and `<title>` prefix.
    pub title: String,
    /// Date printed on the cover and methodology note.
    pub generated_on: NaiveDate,
    /// Skills listed as running on the light model tier in the audit log.
    pub haiku_skills: Vec<String>,
}

impl ReportOptions {
    /// Options for a report generated today.
    pub fn from_config(report: &ReportConfig, models: &ModelsConfig) -> Self {
        Self {
            title: report.title.clone(),
            generated_on: Local::now().date_naive(),
            haiku_skills: models.haiku_skills.clone(),
        }
    }
}

/// One body chapter of the report, in document order.
#[derive(Debug, Clone, Copy)]
pub enum Chapter<'a> {
    ExecutiveSummary,
    ScoreBreakdown,
    QuickWins,
    CriticalIssues,
    Roadmap,
    Agent(&'a AgentReport),
    QualityGate,
    Competitive,
    ScoringMethodology,
    AuditLog,
}

impl Chapter<'_> {
    pub fn label(&self) -> &str {
        match self {
            Self::ExecutiveSummary => "Executive Summary",
            Self::ScoreBreakdown => "Score Breakdown",
            Self::QuickWins => "Top Quick Wins",
            Self::CriticalIssues => "Critical Issues",
            Self::Roadmap => "90-Day Roadmap",
            Self::Agent(agent) => &agent.title,
            Self::QualityGate => "Quality Gate Results",
            Self::Competitive => "Competitive Position",
            Self::ScoringMethodology => "Scoring Methodology",
            Self::AuditLog => "Audit Log",
        }
    }

    /// `id` of the chapter's wrapping `<div>`; TOC links point here.
    pub fn anchor(&self) -> String {
        match self {
            Self::Agent(agent) => agent_anchor(&agent.name),
            other => chapter_anchor(other.label()),
        }
    }
}

/// Builds the report HTML for one audit.
pub struct ReportAssembler<'a> {
    audit: &'a Audit,
    options: &'a ReportOptions,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(audit: &'a Audit, options: &'a ReportOptions) -> Self {
        Self { audit, options }
    }

    /// Body chapters in document order.
    pub fn chapters(&self) -> Vec<Chapter<'a>> {
        let mut chapters = vec![
            Chapter::ExecutiveSummary,
            Chapter::ScoreBreakdown,
            Chapter::QuickWins,
            Chapter::CriticalIssues,
            Chapter::Roadmap,
        ];
        chapters.extend(self.audit.agents.iter().map(Chapter::Agent));
        chapters.extend([
            Chapter::QualityGate,
            Chapter::Competitive,
            Chapter::ScoringMethodology,
            Chapter::AuditLog,
        ]);
        chapters
    }

    /// Render the whole document in one go.
    #[instrument(skip_all, fields(domain = %self.audit.domain))]
    pub fn render(&self) -> String {
        let chapters: Vec<String> = self
            .chapters()
            .into_iter()
            .map(|chapter| self.render_chapter(chapter))
            .collect();
        self.render_document(&chapters)
    }

    /// Wrap pre-rendered body chapters with head, cover, methodology and TOC.
    pub fn render_document(&self, chapters: &[String]) -> String {
        let title = format!("{}: {}", self.options.title, self.audit.business_name());

        let mut parts: Vec<String> = vec![
            "<!DOCTYPE html>".into(),
            "<html lang=\"en\">".into(),
            "<head>".into(),
            "<meta charset=\"UTF-8\">".into(),
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">".into(),
            format!("<title>{}</title>", encode_text(&title)),
            format!("<style>\n{STYLESHEET}</style>"),
            "</head>".into(),
            "<body>".into(),
            self.cover_page(),
            self.methodology(),
            render_toc(&build_toc(&self.audit.agents)),
            "<div class=\"content\">".into(),
        ];
        parts.extend(chapters.iter().cloned());
        parts.extend([
            "</div>".into(),
            "<div class=\"page-footer\">Confidential</div>".into(),
            "</body>".into(),
            "</html>".into(),
        ]);

        let html = parts.join("\n");
        debug!(bytes = html.len(), chapters = chapters.len(), "document rendered");
        html
    }

    pub fn render_chapter(&self, chapter: Chapter<'_>) -> String {
        let markdown = match chapter {
            Chapter::Agent(agent) => return self.agent_chapter(agent),
            Chapter::ExecutiveSummary => self.section_or(
                &["Executive Summary"],
                "## Executive Summary\n\nNo executive summary available.",
            ),
            Chapter::ScoreBreakdown => self
                .section(&["Score Breakdown"])
                .unwrap_or_else(|| self.score_table()),
            Chapter::QuickWins => self.section_or(
                &["Top 10 Quick Wins", "Quick Wins"],
                "## Top Quick Wins\n\nSee individual agent reports for specific recommendations.",
            ),
            Chapter::CriticalIssues => self.section_or(
                &["Critical Issues"],
                "## Critical Issues\n\nSee individual agent reports for critical findings.",
            ),
            Chapter::Roadmap => self.section_or(
                &["90-Day Roadmap", "Roadmap"],
                "## 90-Day Roadmap\n\nSee individual agent reports for implementation timelines.",
            ),
            Chapter::QualityGate => match &self.audit.review {
                Some(review) if !review.trim().is_empty() => review.clone(),
                _ => "## Quality Gate Results\n\nNo CMO review available.".into(),
            },
            Chapter::Competitive => self
                .section(&["Competitive Position"])
                .unwrap_or_else(|| match self.audit.context_value("competitors") {
                    Some(competitors) => format!(
                        "## Competitive Position\n\nCompetitors identified: {competitors}"
                    ),
                    None => "## Competitive Position\n\nNo competitive data available.".into(),
                }),
            Chapter::ScoringMethodology => self.section_or(
                &["Scoring Methodology"],
                SCORING_METHODOLOGY,
            ),
            Chapter::AuditLog => self
                .section(&["Audit Log"])
                .unwrap_or_else(|| self.audit_log()),
        };

        format!(
            "<div class=\"chapter\" id=\"{}\">\n{}\n</div>",
            encode_double_quoted_attribute(&chapter.anchor()),
            convert(&markdown)
        )
    }

    // -----------------------------------------------------------------------
    // Front matter
    // -----------------------------------------------------------------------

    fn cover_page(&self) -> String {
        let audit = self.audit;
        let field = |key: &str| encode_text(audit.context_value(key).unwrap_or_default()).into_owned();
        let grade = Grade::from_score(audit.maturity_score);

        format!(
            "<div class=\"cover-page\">\n\
             <h1>{title}</h1>\n\
             <div class=\"subtitle\">{business}</div>\n\
             <div class=\"meta-table\">\n\
             <strong>URL</strong> {url}<br>\n\
             <strong>Business Type</strong> {btype}<br>\n\
             <strong>Industry</strong> {industry}<br>\n\
             <strong>Date</strong> {date}<br>\n\
             <strong>Specialists</strong> {count} agents deployed<br>\n\
             </div>\n\
             <div class=\"maturity-score\">{score}<span style=\"font-size:24pt;opacity:0.7\">/100</span></div>\n\
             <div class=\"maturity-label\">Marketing Maturity Score &mdash; Grade {grade}</div>\n\
             </div>",
            title = encode_text(&self.options.title),
            business = encode_text(audit.business_name()),
            url = encode_text(audit.context_value("url").unwrap_or(&audit.domain)),
            btype = field("type"),
            industry = field("industry"),
            date = self.date(),
            count = audit.agents.len(),
            score = audit.maturity_score,
        )
    }

    fn methodology(&self) -> String {
        if let Some(section) = self.section(&["Audit Methodology"]) {
            return format!("<div class=\"chapter\">\n{}\n</div>", convert(&section));
        }

        format!(
            "<div class=\"chapter\">\n\
             <div class=\"alert alert-info\">\n\
             <strong>About This Audit</strong><br>\n\
             This is an automated external assessment conducted on {date} using {count} specialist agents. \
             It evaluates marketing infrastructure maturity from publicly available data: site crawl content, \
             search results and industry benchmarks.<br><br>\n\
             <strong>What this audit did NOT have access to:</strong> analytics data, conversion rates, \
             revenue by channel, customer data, internal business metrics or user research.<br><br>\n\
             <strong>Revenue estimates are modeled, not measured.</strong> Validate them with internal data \
             before using them for budgeting or planning. Every estimate carries a confidence level \
             (HIGH/MEDIUM/LOW) for the reliability of the underlying data.\n\
             </div>\n\
             </div>",
            date = self.date(),
            count = self.audit.agents.len(),
        )
    }

    // -----------------------------------------------------------------------
    // Chapters built from agent data
    // -----------------------------------------------------------------------

    fn agent_chapter(&self, agent: &AgentReport) -> String {
        let badge = agent
            .score
            .map(|score| {
                format!(
                    " <span class=\"score-badge {}\">{score}</span>",
                    score.badge().css_class()
                )
            })
            .unwrap_or_default();

        let mut meta = format!("{:.1} KB report", agent.size_kb());
        let gate = self
            .audit
            .review
            .as_deref()
            .and_then(|review| gate_for(review, &agent.name, &agent.title));
        match gate {
            Some(Verdict::Pass) => meta.push_str(" &bull; Quality Gate: <span class=\"gate-pass\">PASS</span>"),
            Some(Verdict::Fail) => meta.push_str(" &bull; Quality Gate: <span class=\"gate-fail\">FAIL</span>"),
            Some(Verdict::Unknown) | None => {}
        }

        format!(
            "<div class=\"chapter\" id=\"{anchor}\">\n\
             <div class=\"chapter-header\">\n\
             <h2>{title}{badge}</h2>\n\
             <div class=\"chapter-meta\">{meta}</div>\n\
             </div>\n\
             {body}\n\
             </div>",
            anchor = encode_double_quoted_attribute(&agent_anchor(&agent.name)),
            title = encode_text(&agent.title),
            body = convert(&agent.content),
        )
    }

    /// Markdown score table over agents that reported a score.
    fn score_table(&self) -> String {
        let mut md = String::from("## Score Breakdown\n\n");
        let rows: Vec<String> = self
            .audit
            .agents
            .iter()
            .filter_map(|agent| {
                let score = agent.score?;
                Some(format!("| {} | {score} | {} |", agent.title, score.grade()))
            })
            .collect();

        if rows.is_empty() {
            md.push_str("No agent scores available.");
        } else {
            md.push_str("| Area | Score | Grade |\n|------|-------|-------|\n");
            md.push_str(&rows.join("\n"));
        }
        md
    }

    /// Markdown table of every specialist with model tier, score and size.
    fn audit_log(&self) -> String {
        let mut md = String::from("## Audit Log\n\n");
        if self.audit.agents.is_empty() {
            md.push_str("No specialist reports were produced.");
            return md;
        }

        md.push_str("| Specialist | Model | Score | Report Size |\n|-----------|-------|-------|------------|");
        for agent in &self.audit.agents {
            let model = ModelTier::for_skill(&agent.name, &self.options.haiku_skills);
            let score = agent
                .score
                .map_or_else(|| "--".to_string(), |s| s.to_string());
            let _ = write!(
                md,
                "\n| {} | {model} | {score} | {:.1} KB |",
                agent.title,
                agent.size_kb()
            );
        }
        md
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn section(&self, headers: &[&str]) -> Option<String> {
        extract_first(self.audit.synthesis_text(), headers)
    }

    fn section_or(&self, headers: &[&str], fallback: &str) -> String {
        self.section(headers).unwrap_or_else(|| fallback.to_string())
    }

    fn date(&self) -> String {
        self.options.generated_on.format("%B %d, %Y").to_string()
    }
}

/// Write the report atomically (temp file in the same directory, then rename).
/// Returns the number of bytes written.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_report(path: &Path, html: &str) -> Result<u64> {
    let dir = path
        .parent()
        .ok_or_else(|| AuditBookError::validation(format!("no parent directory: {}", path.display())))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| AuditBookError::validation(format!("not a file path: {}", path.display())))?;
    let temp = dir.join(format!(".{}.tmp", file_name.to_string_lossy()));

    std::fs::write(&temp, html).map_err(|e| AuditBookError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| AuditBookError::io(path, e))?;

    let bytes = html.len() as u64;
    info!(bytes, "report written");
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
