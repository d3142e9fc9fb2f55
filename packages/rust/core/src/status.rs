//! Point-in-time status of an audit directory.
//!
//! A [`Snapshot`] is everything the dashboard draws and `status --json`
//! prints. Capturing one only reads the filesystem.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::instrument;

use auditbook_shared::{
    AgentStatus, DashboardConfig, ModelTier, ModelsConfig, Phase, Result, ReviewEntry, Score,
};

use crate::audit::{
    BATCH1_HANDOFF, BATCH23_HANDOFF, COLLECTORS_FILE, CONTEXT_FILE, CRAWL_FILE,
    REVIEW_FILE, SYNTHESIS_FILE, agent_files, domain_from_dir, modified_at, parse_agent_score,
    read_optional,
};
use crate::phase::detect_phase;
use crate::review::{GateSummary, parse_review};

/// Page marker in `crawl-data.md`.
const PAGE_MARKER: &str = "## PAGE:";

static TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Type:\s*(.+)").expect("business type regex"));
static INDUSTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Industry:\s*(.+)").expect("industry regex"));

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub dir: PathBuf,
    pub domain: String,
    pub phase: Phase,
    /// `context.md` modification time, the best guess at session start.
    pub started_at: Option<DateTime<Utc>>,
    pub business_type: Option<String>,
    pub industry: Option<String>,
    pub crawl: Option<CrawlStats>,
    /// Line count of `collectors-data.md`.
    pub collectors_lines: Option<usize>,
    pub agents: Vec<AgentRow>,
    pub handoffs: Handoffs,
    /// Present once the review file exists.
    pub gate: Option<GateSummary>,
    pub report: Option<ReportFile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    pub pages: usize,
    pub lines: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentRow {
    pub name: String,
    pub model: ModelTier,
    pub score: Option<Score>,
    pub status: AgentStatus,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
    /// Review row whose first cell is exactly this agent's name.
    pub gate: Option<ReviewEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Handoffs {
    pub batch1: bool,
    pub batch23: bool,
}

impl Handoffs {
    pub fn any(&self) -> bool {
        self.batch1 || self.batch23
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl Snapshot {
    #[instrument(level = "debug", skip_all, fields(dir = %dir.display()))]
    pub fn capture(dir: &Path, dashboard: &DashboardConfig, models: &ModelsConfig) -> Result<Self> {
        let phase = detect_phase(dir)?;

        let context_path = dir.join(CONTEXT_FILE);
        let context = read_optional(&context_path);
        let business_type = context.as_deref().and_then(|c| first_capture(&TYPE_RE, c));
        let industry = context.as_deref().and_then(|c| first_capture(&INDUSTRY_RE, c));

        let crawl = read_optional(&dir.join(CRAWL_FILE)).map(|text| CrawlStats {
            pages: text.matches(PAGE_MARKER).count(),
            lines: text.lines().count(),
        });
        let collectors_lines =
            read_optional(&dir.join(COLLECTORS_FILE)).map(|text| text.lines().count());

        let review = read_optional(&dir.join(REVIEW_FILE)).map(|text| parse_review(&text));
        let gate = review.as_ref().map(GateSummary::from_entries);

        let agents = agent_files(dir)?
            .iter()
            .map(|path| {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                let score = read_optional(path).and_then(|text| parse_agent_score(&text));
                AgentRow {
                    model: ModelTier::for_skill(&name, &models.haiku_skills),
                    status: AgentStatus::from_size(size_bytes, dashboard.truncated_below_bytes),
                    gate: review.as_ref().and_then(|r| r.get(&name).copied()),
                    name,
                    score,
                    size_bytes,
                    modified: modified_at(path),
                }
            })
            .collect();

        let report_path = dir.join(SYNTHESIS_FILE);
        let report = std::fs::metadata(&report_path)
            .ok()
            .map(|m| ReportFile {
                path: report_path,
                size_bytes: m.len(),
            });

        Ok(Self {
            dir: dir.to_path_buf(),
            domain: domain_from_dir(dir),
            phase,
            started_at: modified_at(&context_path),
            business_type,
            industry,
            crawl,
            collectors_lines,
            agents,
            handoffs: Handoffs {
                batch1: dir.join(BATCH1_HANDOFF).exists(),
                batch23: dir.join(BATCH23_HANDOFF).exists(),
            },
            gate,
            report,
        })
    }

    pub fn complete_count(&self) -> usize {
        self.count_status(AgentStatus::Complete)
    }

    pub fn truncated_count(&self) -> usize {
        self.count_status(AgentStatus::Truncated)
    }

    /// Mean of raw score values over agents that reported one.
    pub fn average_score(&self) -> Option<f64> {
        let scores: Vec<f64> = self
            .agents
            .iter()
            .filter_map(|a| a.score.map(|s| f64::from(s.value)))
            .collect();
        if scores.is_empty() {
            return None;
        }
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }

    fn count_status(&self, status: AgentStatus) -> usize {
        self.agents.iter().filter(|a| a.status == status).count()
    }
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|caps| caps[1].trim().to_string())
}
