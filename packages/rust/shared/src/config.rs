//! Application configuration for auditbook.
//!
//! User config lives at `~/.auditbook/auditbook.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AuditBookError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "auditbook.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".auditbook";

// ---------------------------------------------------------------------------
// Config structs (matching auditbook.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Report output settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Headless browser used for PDF output.
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Live dashboard settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Model tier assignment for specialist agents.
    #[serde(default)]
    pub models: ModelsConfig,
}

/// `[report]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// HTML file name written inside the audit directory.
    #[serde(default = "default_html_file")]
    pub html_file: String,

    /// PDF file name written inside the audit directory.
    #[serde(default = "default_pdf_file")]
    pub pdf_file: String,

    /// Document title prefix (cover heading and `<title>`).
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            html_file: default_html_file(),
            pdf_file: default_pdf_file(),
            title: default_title(),
        }
    }
}

fn default_html_file() -> String {
    "FULL-REPORT.html".into()
}
fn default_pdf_file() -> String {
    "FULL-REPORT.pdf".into()
}
fn default_title() -> String {
    "Marketing Audit".into()
}

/// `[browser]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Path to a Chrome/Chromium executable.
    #[serde(default = "default_browser_path")]
    pub path: String,

    /// Seconds to wait for the browser before giving up.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Virtual time the page gets to lay out before printing.
    #[serde(default = "default_virtual_time_budget")]
    pub virtual_time_budget_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            path: default_browser_path(),
            timeout_secs: default_timeout_secs(),
            virtual_time_budget_ms: default_virtual_time_budget(),
        }
    }
}

impl BrowserConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_browser_path() -> String {
    if cfg!(target_os = "macos") {
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome".into()
    } else {
        "google-chrome".into()
    }
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_virtual_time_budget() -> u64 {
    3000
}

/// `[dashboard]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Milliseconds between filesystem snapshots.
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,

    /// Agent reports smaller than this are flagged as truncated.
    #[serde(default = "default_truncated_below")]
    pub truncated_below_bytes: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_ms: default_refresh_ms(),
            truncated_below_bytes: default_truncated_below(),
        }
    }
}

impl DashboardConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}

fn default_refresh_ms() -> u64 {
    2000
}
fn default_truncated_below() -> u64 {
    200
}

/// `[models]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Skills that run on the light model tier; everything else is standard.
    #[serde(default = "default_haiku_skills")]
    pub haiku_skills: Vec<String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            haiku_skills: default_haiku_skills(),
        }
    }
}

fn default_haiku_skills() -> Vec<String> {
    [
        "analytics-tracking",
        "schema-markup",
        "form-cro",
        "popup-cro",
        "product-feed",
        "geo-audit",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.auditbook/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AuditBookError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.auditbook/auditbook.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AuditBookError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        AuditBookError::parse(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| AuditBookError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| AuditBookError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| AuditBookError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject values that would stall the dashboard or the browser step.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.dashboard.refresh_ms == 0 {
        return Err(AuditBookError::config("dashboard.refresh_ms must be positive"));
    }
    if config.browser.timeout_secs == 0 {
        return Err(AuditBookError::config("browser.timeout_secs must be positive"));
    }
    if config.report.html_file.trim().is_empty() || config.report.pdf_file.trim().is_empty() {
        return Err(AuditBookError::config("report file names must not be empty"));
    }
    Ok(())
}
