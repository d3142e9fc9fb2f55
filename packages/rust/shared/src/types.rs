//! Core domain types for audit reports.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// A `value/max` score as written in an agent report (`## Score: 62/100`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub value: u32,
    pub max: u32,
}

impl Score {
    pub fn new(value: u32, max: u32) -> Self {
        Self { value, max }
    }

    /// Percentage of the maximum, 0 when the maximum is 0.
    pub fn percent(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        f64::from(self.value) / f64::from(self.max) * 100.0
    }

    /// Letter grade for the truncated percentage.
    pub fn grade(&self) -> Grade {
        Grade::from_score(self.percent() as u32)
    }

    pub fn badge(&self) -> Badge {
        let pct = self.percent();
        if pct >= 70.0 {
            Badge::High
        } else if pct >= 50.0 {
            Badge::Mid
        } else {
            Badge::Low
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value, self.max)
    }
}

/// Score badge tier shown next to chapter headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    High,
    Mid,
    Low,
}

impl Badge {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::High => "score-high",
            Self::Mid => "score-mid",
            Self::Low => "score-low",
        }
    }
}

// ---------------------------------------------------------------------------
// Grade
// ---------------------------------------------------------------------------

/// Letter grade for a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => Self::A,
            65..=79 => Self::B,
            45..=64 => Self::C,
            25..=44 => Self::D,
            _ => Self::F,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Quality gate
// ---------------------------------------------------------------------------

/// Quality gate verdict from the review file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
    /// A row matched but its verdict cell is neither PASS nor FAIL.
    Unknown,
}

impl Verdict {
    /// Read a verdict out of free text. PASS wins when both appear.
    pub fn from_text(text: &str) -> Self {
        if text.contains("PASS") {
            Self::Pass
        } else if text.contains("FAIL") {
            Self::Fail
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Unknown => "?",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One specialist's row in the review table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub verdict: Verdict,
    /// Rubric total, out of [`ReviewEntry::RUBRIC_MAX`].
    pub total: u32,
}

impl ReviewEntry {
    pub const RUBRIC_MAX: u32 = 25;
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Audit progress phase, inferred from which files exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Reconnaissance,
    Collectors,
    SkillSelection,
    Batch1,
    WarmHandoff,
    Batch3,
    Batch4,
    QualityGate,
    Remediation,
    Complete,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Reconnaissance => "RECONNAISSANCE",
            Self::Collectors => "COLLECTORS",
            Self::SkillSelection => "SKILL SELECTION",
            Self::Batch1 => "BATCH 1 — FOUNDATION",
            Self::WarmHandoff => "WARM HANDOFF",
            Self::Batch3 => "BATCH 3 — GROWTH",
            Self::Batch4 => "BATCH 4 — ADVANCED",
            Self::QualityGate => "QUALITY GATE",
            Self::Remediation => "REMEDIATION",
            Self::Complete => "COMPLETE",
        }
    }

    /// True while specialist agents are running.
    pub fn is_batch(self) -> bool {
        matches!(self, Self::Batch1 | Self::Batch3 | Self::Batch4)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// Model tier a specialist agent runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Haiku,
    Sonnet,
}

impl ModelTier {
    /// Skills listed in `haiku_skills` run on the light tier.
    pub fn for_skill(name: &str, haiku_skills: &[String]) -> Self {
        if haiku_skills.iter().any(|s| s == name) {
            Self::Haiku
        } else {
            Self::Sonnet
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Haiku => "haiku",
            Self::Sonnet => "sonnet",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an agent report looks finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Complete,
    Truncated,
}

impl AgentStatus {
    pub fn from_size(bytes: u64, truncated_below: u64) -> Self {
        if bytes < truncated_below {
            Self::Truncated
        } else {
            Self::Complete
        }
    }
}
