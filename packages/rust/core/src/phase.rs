//! Audit phase detection from filesystem state.

use std::path::Path;

use tracing::debug;

use auditbook_shared::{Phase, Result};

use crate::audit::{
    BATCH1_HANDOFF, BATCH23_HANDOFF, COLLECTORS_FILE, CONTEXT_FILE, REVIEW_FILE, SYNTHESIS_FILE,
    agent_files, modified_at,
};

/// More agent reports than this after the batch 1 handoff means batches 2
/// and 3 are under way.
const BATCH3_AGENT_THRESHOLD: usize = 5;

/// Infer the current phase. Later pipeline artifacts take precedence.
pub fn detect_phase(dir: &Path) -> Result<Phase> {
    let agents = agent_files(dir)?;

    let phase = if dir.join(SYNTHESIS_FILE).exists() {
        Phase::Complete
    } else if dir.join(REVIEW_FILE).exists() {
        let review_time = modified_at(&dir.join(REVIEW_FILE));
        let remediating = agents
            .iter()
            .any(|agent| matches!((modified_at(agent), review_time), (Some(a), Some(r)) if a > r));
        if remediating {
            Phase::Remediation
        } else {
            Phase::QualityGate
        }
    } else if dir.join(BATCH23_HANDOFF).exists() && !agents.is_empty() {
        Phase::Batch4
    } else if dir.join(BATCH1_HANDOFF).exists() && agents.len() > BATCH3_AGENT_THRESHOLD {
        Phase::Batch3
    } else if dir.join(BATCH1_HANDOFF).exists() {
        Phase::WarmHandoff
    } else if !agents.is_empty() {
        Phase::Batch1
    } else if dir.join(CONTEXT_FILE).exists() {
        if dir.join(COLLECTORS_FILE).exists() {
            Phase::SkillSelection
        } else {
            Phase::Collectors
        }
    } else {
        Phase::Reconnaissance
    };

    debug!(dir = %dir.display(), agents = agents.len(), ?phase, "phase detected");
    Ok(phase)
}
