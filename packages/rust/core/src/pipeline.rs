//! End-to-end `build` pipeline: audit directory → HTML report → PDF.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use auditbook_shared::{BrowserConfig, ModelsConfig, ReportConfig, Result};

use crate::assembler::{ReportAssembler, ReportOptions, write_report};
use crate::audit::Audit;
use crate::pdf::{ChromeRenderer, PdfOutcome};

/// Configuration for [`build_report`].
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Audit directory to read from and write the report into.
    pub audit_dir: PathBuf,
    pub report: ReportConfig,
    pub models: ModelsConfig,
    /// Browser for the PDF step; `None` skips it.
    pub browser: Option<BrowserConfig>,
}

/// Result of [`build_report`].
#[derive(Debug)]
pub struct BuildResult {
    pub html_path: PathBuf,
    pub html_bytes: u64,
    /// `None` when the PDF step was skipped.
    pub pdf: Option<PdfOutcome>,
    pub chapter_count: usize,
    pub agent_count: usize,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each body chapter is converted.
    fn chapter_rendered(&self, label: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn chapter_rendered(&self, _label: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Run the full `build` pipeline.
///
/// 1. Load the audit directory
/// 2. Convert every chapter
/// 3. Write the HTML report atomically
/// 4. Print it to PDF (if a browser is configured)
#[instrument(skip_all, fields(dir = %config.audit_dir.display()))]
pub async fn build_report(
    config: &BuildConfig,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();

    // --- Phase 1: Load ---
    progress.phase("Loading audit directory");
    let audit = Audit::load(&config.audit_dir)?;
    if audit.synthesis.is_none() {
        warn!("no synthesis report found, using fallback chapters");
    }

    // --- Phase 2: Convert chapters ---
    progress.phase("Converting chapters");
    let options = ReportOptions::from_config(&config.report, &config.models);
    let assembler = ReportAssembler::new(&audit, &options);
    let chapters = assembler.chapters();
    let total = chapters.len();

    let mut rendered = Vec::with_capacity(total);
    for (i, chapter) in chapters.iter().enumerate() {
        rendered.push(assembler.render_chapter(*chapter));
        progress.chapter_rendered(chapter.label(), i + 1, total);
    }

    // --- Phase 3: Write HTML ---
    progress.phase("Writing HTML report");
    let html = assembler.render_document(&rendered);
    let html_path = config.audit_dir.join(&config.report.html_file);
    let html_bytes = write_report(&html_path, &html)?;

    // --- Phase 4: PDF ---
    let pdf = match &config.browser {
        Some(browser) => {
            progress.phase("Printing PDF");
            let pdf_path = config.audit_dir.join(&config.report.pdf_file);
            let renderer = ChromeRenderer::from_config(browser);
            Some(renderer.render(&html_path, &pdf_path).await?)
        }
        None => None,
    };

    let result = BuildResult {
        html_path,
        html_bytes,
        pdf,
        chapter_count: total,
        agent_count: audit.agents.len(),
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        html_bytes = result.html_bytes,
        chapters = result.chapter_count,
        pdf = result.pdf.as_ref().is_some_and(PdfOutcome::is_rendered),
        elapsed_ms = result.elapsed.as_millis(),
        "build pipeline complete"
    );

    Ok(result)
}
