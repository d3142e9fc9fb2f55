//! Audit directory loader.
//!
//! Reads everything the upstream agents leave in an audit directory into one
//! [`Audit`] value. Only a missing directory is an error; every other input
//! is optional and degrades to an empty value with a warning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use auditbook_shared::{AuditBookError, Result, Score};

/// Directory name prefix stripped to get the audited domain.
const DIR_PREFIX: &str = "marketing-audit-";

pub const CONTEXT_FILE: &str = "context.md";
pub const CRAWL_FILE: &str = "crawl-data.md";
pub const COLLECTORS_FILE: &str = "collectors-data.md";
pub const BRAND_DNA_FILE: &str = "brand-dna.md";
pub const SYNTHESIS_FILE: &str = "FULL-REPORT.md";
pub const AGENTS_DIR: &str = "agents";
pub const REVIEW_FILE: &str = "review/cmo-review.md";
pub const BATCH1_HANDOFF: &str = "handoffs/batch1-summary.md";
pub const BATCH23_HANDOFF: &str = "handoffs/batch23-summary.md";

static CONTEXT_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-\s+(.+?):\s+(.+)$").expect("context line regex"));

static AGENT_SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"##\s*Score:\s*(\d+)\s*/\s*(\d+)").expect("agent score regex")
});

/// Phrasings of the overall score in the synthesis report, tried in order.
static MATURITY_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)Overall Maturity Score:\s*(\d+)/100",
        r"(?i)Marketing Maturity Score:\s*(\d+)/100",
        r"(?i)maturity.*?(\d+)/100",
        r"(?i)\*\*(\d+)/100 overall maturity",
        r"(?i)scores a \*\*(\d+)/100",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("maturity score regex"))
    .collect()
});

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One specialist agent's markdown report.
#[derive(Debug, Clone)]
pub struct AgentReport {
    /// File stem, e.g. `seo-audit`.
    pub name: String,
    /// Display title, e.g. `Seo Audit`.
    pub title: String,
    pub score: Option<Score>,
    pub content: String,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl AgentReport {
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

/// Everything loaded from one audit directory.
#[derive(Debug, Clone)]
pub struct Audit {
    pub dir: PathBuf,
    pub domain: String,
    /// `- Key: Value` lines of `context.md`, keys lowercased.
    pub context: BTreeMap<String, String>,
    pub brand_dna: Option<String>,
    pub synthesis: Option<String>,
    pub review: Option<String>,
    /// Sorted by file name.
    pub agents: Vec<AgentReport>,
    /// Overall score from the synthesis report, 0 when absent.
    pub maturity_score: u32,
}

impl Audit {
    /// Load an audit directory.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(AuditBookError::validation(format!(
                "audit directory not found: {}",
                dir.display()
            )));
        }

        let context = read_optional(&dir.join(CONTEXT_FILE))
            .map(|text| parse_context(&text))
            .unwrap_or_default();
        let synthesis = read_optional(&dir.join(SYNTHESIS_FILE));
        let maturity_score = synthesis.as_deref().map(parse_maturity_score).unwrap_or(0);

        let agents = agent_files(dir)?
            .iter()
            .map(|path| load_agent(path))
            .collect::<Vec<_>>();

        let audit = Self {
            dir: dir.to_path_buf(),
            domain: domain_from_dir(dir),
            context,
            brand_dna: read_optional(&dir.join(BRAND_DNA_FILE)),
            synthesis,
            review: read_optional(&dir.join(REVIEW_FILE)),
            agents,
            maturity_score,
        };

        info!(
            domain = %audit.domain,
            agents = audit.agents.len(),
            has_synthesis = audit.synthesis.is_some(),
            has_review = audit.review.is_some(),
            maturity = audit.maturity_score,
            "audit loaded"
        );

        Ok(audit)
    }

    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }

    /// Business name from context, falling back to the domain.
    pub fn business_name(&self) -> &str {
        self.context_value("business").unwrap_or(&self.domain)
    }

    pub fn synthesis_text(&self) -> &str {
        self.synthesis.as_deref().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Domain name from the audit directory name.
pub fn domain_from_dir(dir: &Path) -> String {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.replace(DIR_PREFIX, "")
}

/// Parse `- Key: Value` lines. Later keys overwrite earlier ones.
pub fn parse_context(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .filter_map(|line| CONTEXT_LINE_RE.captures(line))
        .map(|caps| (caps[1].trim().to_lowercase(), caps[2].trim().to_string()))
        .collect()
}

/// First `## Score: N/M` heading in an agent report.
pub fn parse_agent_score(text: &str) -> Option<Score> {
    let caps = AGENT_SCORE_RE.captures(text)?;
    let value = caps[1].parse().ok()?;
    let max = caps[2].parse().ok()?;
    Some(Score::new(value, max))
}

pub fn parse_maturity_score(text: &str) -> u32 {
    MATURITY_RES
        .iter()
        .find_map(|re| re.captures(text).and_then(|caps| caps[1].parse().ok()))
        .unwrap_or(0)
}

/// `seo-audit` → `Seo Audit`.
///
/// Every alphabetic run starts upper-case and continues lower-case.
pub fn title_from_stem(stem: &str) -> String {
    let mut title = String::with_capacity(stem.len());
    let mut prev_alpha = false;
    for c in stem.chars() {
        let c = if c == '-' { ' ' } else { c };
        if c.is_alphabetic() {
            if prev_alpha {
                title.extend(c.to_lowercase());
            } else {
                title.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            title.push(c);
            prev_alpha = false;
        }
    }
    title
}

// ---------------------------------------------------------------------------
// Filesystem helpers
// ---------------------------------------------------------------------------

/// `agents/*.md`, sorted by file name. A missing `agents/` is empty.
pub fn agent_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let agents_dir = dir.join(AGENTS_DIR);
    if !agents_dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries =
        std::fs::read_dir(&agents_dir).map_err(|e| AuditBookError::io(&agents_dir, e))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    Ok(files)
}

/// Read an optional text file. Missing is `None`; unreadable warns and is `None`.
pub fn read_optional(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read file, skipping");
            None
        }
    }
}

/// File modification time, if the platform reports one.
pub fn modified_at(path: &Path) -> Option<DateTime<Utc>> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

fn load_agent(path: &Path) -> AgentReport {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content = read_optional(path).unwrap_or_default();
    let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let score = parse_agent_score(&content);

    debug!(agent = %name, size_bytes, score = ?score, "loaded agent report");

    AgentReport {
        title: title_from_stem(&name),
        name,
        score,
        content,
        size_bytes,
        modified: modified_at(path),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
