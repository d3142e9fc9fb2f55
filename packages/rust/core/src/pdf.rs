//! HTML → PDF rasterization through a headless Chrome/Chromium.
//!
//! Every browser failure is a [`PdfOutcome`], not an error: the HTML report
//! is already on disk by the time this runs.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use auditbook_shared::{AuditBookError, BrowserConfig, Result};

/// Characters of browser stderr kept in [`PdfOutcome::Failed`].
const STDERR_LIMIT: usize = 500;

/// What happened when the browser was asked to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfOutcome {
    Rendered { path: PathBuf, bytes: u64 },
    BrowserMissing { browser: PathBuf },
    TimedOut { after: Duration },
    /// The browser ran but no PDF appeared.
    Failed { stderr: String },
}

impl PdfOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }
}

#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    pub browser: PathBuf,
    pub timeout: Duration,
    pub virtual_time_budget_ms: u64,
}

impl ChromeRenderer {
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            browser: PathBuf::from(&config.path),
            timeout: config.timeout(),
            virtual_time_budget_ms: config.virtual_time_budget_ms,
        }
    }

    /// Command-line arguments for printing `html` to `pdf`.
    pub fn args(&self, html: &Path, pdf: &Path) -> Vec<OsString> {
        let mut print_to = OsString::from("--print-to-pdf=");
        print_to.push(pdf);

        vec![
            "--headless".into(),
            "--disable-gpu".into(),
            "--no-sandbox".into(),
            "--run-all-compositor-stages-before-draw".into(),
            format!("--virtual-time-budget={}", self.virtual_time_budget_ms).into(),
            print_to,
            "--no-pdf-header-footer".into(),
            html.as_os_str().to_owned(),
        ]
    }

    /// Print `html` to `pdf`. A stale `pdf` is removed first so only a fresh
    /// file counts as success.
    #[instrument(skip_all, fields(browser = %self.browser.display(), pdf = %pdf.display()))]
    pub async fn render(&self, html: &Path, pdf: &Path) -> Result<PdfOutcome> {
        let Some(browser) = resolve_browser(&self.browser) else {
            warn!("browser not found");
            return Ok(PdfOutcome::BrowserMissing {
                browser: self.browser.clone(),
            });
        };

        match tokio::fs::remove_file(pdf).await {
            Ok(()) => debug!("removed stale PDF"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AuditBookError::io(pdf, e)),
        }

        let mut command = Command::new(&browser);
        command
            .args(self.args(html, pdf))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(path = %browser.display(), "spawning browser");
        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis(), "browser timed out");
                return Ok(PdfOutcome::TimedOut {
                    after: self.timeout,
                });
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PdfOutcome::BrowserMissing { browser });
            }
            Ok(Err(e)) => {
                return Err(AuditBookError::render(format!(
                    "failed to run {}: {e}",
                    browser.display()
                )));
            }
            Ok(Ok(output)) => output,
        };

        match tokio::fs::metadata(pdf).await {
            Ok(meta) => {
                info!(bytes = meta.len(), "PDF rendered");
                Ok(PdfOutcome::Rendered {
                    path: pdf.to_path_buf(),
                    bytes: meta.len(),
                })
            }
            Err(_) => {
                let stderr: String = String::from_utf8_lossy(&output.stderr)
                    .chars()
                    .take(STDERR_LIMIT)
                    .collect();
                warn!(status = %output.status, "browser produced no PDF");
                Ok(PdfOutcome::Failed { stderr })
            }
        }
    }
}

/// An explicit path must exist; a bare command name is looked up on `PATH`.
fn resolve_browser(browser: &Path) -> Option<PathBuf> {
    if browser.components().count() > 1 || browser.is_absolute() {
        return browser.is_file().then(|| browser.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(browser))
        .find(|candidate| candidate.is_file())
}
