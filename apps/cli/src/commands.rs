//! CLI command definitions, routing, and tracing setup.

use std::fmt::Write as _;
use std::io::Read as _;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use auditbook_core::pdf::PdfOutcome;
use auditbook_core::pipeline::{BuildConfig, BuildResult, ProgressReporter, build_report};
use auditbook_core::status::Snapshot;
use auditbook_shared::{AppConfig, Verdict, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// auditbook: turn a marketing audit directory into a finished report.
#[derive(Parser)]
#[command(
    name = "auditbook",
    version,
    about = "Assemble marketing audit reports into HTML and PDF.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.auditbook/auditbook.toml).
    #[arg(long, env = "AUDITBOOK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build the HTML report (and PDF) for an audit directory.
    Build {
        /// Audit directory, e.g. /tmp/marketing-audit-example.com.
        dir: PathBuf,

        /// Skip the PDF step.
        #[arg(long)]
        no_pdf: bool,

        /// Browser executable, overriding the config file.
        #[arg(long)]
        browser: Option<String>,
    },

    /// Convert one markdown file to an HTML fragment.
    Convert {
        /// Markdown file, or `-` for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a one-shot status snapshot of an audit directory.
    Status {
        /// Audit directory.
        dir: PathBuf,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so `convert`
/// can stream HTML on stdout.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "auditbook=info",
        1 => "auditbook=debug",
        _ => "auditbook=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone();
    match cli.command {
        Command::Build {
            dir,
            no_pdf,
            browser,
        } => cmd_build(config_path.as_deref(), &dir, no_pdf, browser).await,
        Command::Convert { input, output } => cmd_convert(&input, output.as_deref()),
        Command::Status { dir, json } => cmd_status(config_path.as_deref(), &dir, json),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// build
// ---------------------------------------------------------------------------

async fn cmd_build(
    config_path: Option<&Path>,
    dir: &Path,
    no_pdf: bool,
    browser: Option<String>,
) -> Result<()> {
    let config = resolve_config(config_path)?;

    let browser = if no_pdf {
        None
    } else {
        let mut browser_config = config.browser.clone();
        if let Some(path) = browser {
            browser_config.path = path;
        }
        Some(browser_config)
    };

    let build_config = BuildConfig {
        audit_dir: dir.to_path_buf(),
        report: config.report.clone(),
        models: config.models.clone(),
        browser,
    };

    info!(dir = %dir.display(), pdf = !no_pdf, "building report");

    let reporter = CliProgress::new();
    let result = build_report(&build_config, &reporter).await?;

    println!();
    println!("  Report built successfully!");
    println!(
        "  HTML:     {} ({:.1} KB)",
        result.html_path.display(),
        result.html_bytes as f64 / 1024.0
    );
    println!("  PDF:      {}", describe_pdf(result.pdf.as_ref()));
    println!("  Chapters: {} ({} specialists)", result.chapter_count, result.agent_count);
    println!("  Time:     {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn describe_pdf(outcome: Option<&PdfOutcome>) -> String {
    match outcome {
        None => "skipped".to_string(),
        Some(PdfOutcome::Rendered { path, bytes }) => format!(
            "{} ({:.2} MB)",
            path.display(),
            *bytes as f64 / (1024.0 * 1024.0)
        ),
        Some(PdfOutcome::BrowserMissing { browser }) => format!(
            "browser not found at {}; HTML report is still available",
            browser.display()
        ),
        Some(PdfOutcome::TimedOut { after }) => format!(
            "browser timed out after {}s; HTML report is still available",
            after.as_secs()
        ),
        Some(PdfOutcome::Failed { stderr }) => {
            format!("conversion failed; stderr: {}", stderr.trim())
        }
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("static spinner template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn chapter_rendered(&self, label: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Converting [{current}/{total}] {label}"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// convert
// ---------------------------------------------------------------------------

fn cmd_convert(input: &str, output: Option<&Path>) -> Result<()> {
    let markdown = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .wrap_err("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).wrap_err_with(|| format!("failed to read {input}"))?
    };

    let html = auditbook_markdown::convert(&markdown);

    match output {
        Some(path) => {
            std::fs::write(path, &html)
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = html.len(), "wrote HTML fragment");
        }
        None => println!("{html}"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

fn cmd_status(config_path: Option<&Path>, dir: &Path, json: bool) -> Result<()> {
    if !dir.is_dir() {
        return Err(eyre!("audit directory not found: {}", dir.display()));
    }
    let config = resolve_config(config_path)?;
    let snapshot = Snapshot::capture(dir, &config.dashboard, &config.models)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", format_status(&snapshot));
    }
    Ok(())
}

/// Plain-text status summary.
fn format_status(snap: &Snapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  {}  [{}]", snap.domain, snap.phase);

    if let Some(started) = snap.started_at {
        let elapsed = (chrono::Utc::now() - started).num_seconds().max(0);
        let _ = writeln!(out, "  Elapsed:  {:02}:{:02}", elapsed / 60, elapsed % 60);
    }
    if let Some(btype) = &snap.business_type {
        let _ = writeln!(out, "  Type:     {btype}");
    }
    if let Some(industry) = &snap.industry {
        let _ = writeln!(out, "  Industry: {industry}");
    }
    if let Some(crawl) = snap.crawl {
        let _ = writeln!(out, "  Crawled:  {} pages ({} lines)", crawl.pages, crawl.lines);
    }
    if let Some(lines) = snap.collectors_lines {
        let _ = writeln!(out, "  Collect:  {lines} lines");
    }

    if snap.agents.is_empty() {
        let _ = writeln!(out, "\n  No agent reports yet...");
    } else {
        let _ = writeln!(
            out,
            "\n  {:<28} {:<8} {:<10} {:<10} Gate",
            "Agent", "Model", "Score", "Size"
        );
        for agent in &snap.agents {
            let score = agent
                .score
                .map_or_else(|| "--".to_string(), |s| s.to_string());
            let gate = agent
                .gate
                .map(|g| format!("{} {}/25", g.verdict, g.total))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "  {:<28} {:<8} {:<10} {:<10} {gate}",
                agent.name,
                agent.model.as_str(),
                score,
                format!("{:.1}KB", agent.size_bytes as f64 / 1024.0),
            );
        }
        let _ = write!(out, "  Agents: {} complete", snap.complete_count());
        if snap.truncated_count() > 0 {
            let _ = write!(out, ", {} truncated", snap.truncated_count());
        }
        let _ = writeln!(
            out,
            "  |  Avg Score: {:.0}",
            snap.average_score().unwrap_or(0.0)
        );
    }

    if let Some(gate) = snap.gate {
        if let Some(rate) = gate.pass_rate() {
            let _ = writeln!(
                out,
                "  Quality Gate: {} {}  {} {}  ({rate:.0}%)",
                Verdict::Pass,
                gate.passed,
                Verdict::Fail,
                gate.failed
            );
        }
    }
    if let Some(report) = &snap.report {
        let _ = writeln!(out, "  Report ready: {}", report.path.display());
    }
    out
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use auditbook_core::review::GateSummary;
    use auditbook_core::status::{AgentRow, Handoffs};
    use auditbook_shared::{AgentStatus, ModelTier, Phase, ReviewEntry, Score};

    #[test]
    fn cli_parses_build_flags() {
        let cli = Cli::try_parse_from([
            "auditbook",
            "-vv",
            "build",
            "/tmp/marketing-audit-x",
            "--no-pdf",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Command::Build { no_pdf: true, browser: None, .. }
        ));
    }

    #[test]
    fn convert_defaults_to_stdin() {
        let cli = Cli::try_parse_from(["auditbook", "convert"]).unwrap();
        match cli.command {
            Command::Convert { input, output } => {
                assert_eq!(input, "-");
                assert!(output.is_none());
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn pdf_outcomes_described() {
        assert_eq!(describe_pdf(None), "skipped");
        let timed_out = PdfOutcome::TimedOut {
            after: Duration::from_secs(30),
        };
        assert!(describe_pdf(Some(&timed_out)).contains("timed out after 30s"));
        let rendered = PdfOutcome::Rendered {
            path: PathBuf::from("/a/r.pdf"),
            bytes: 1024 * 1024,
        };
        assert_eq!(describe_pdf(Some(&rendered)), "/a/r.pdf (1.00 MB)");
    }

    #[test]
    fn status_text_lists_agents_and_gate() {
        let snap = Snapshot {
            dir: PathBuf::from("/tmp/marketing-audit-acme.test"),
            domain: "acme.test".into(),
            phase: Phase::QualityGate,
            started_at: None,
            business_type: Some("SaaS".into()),
            industry: None,
            crawl: None,
            collectors_lines: None,
            agents: vec![AgentRow {
                name: "seo-audit".into(),
                model: ModelTier::Sonnet,
                score: Some(Score::new(62, 100)),
                status: AgentStatus::Complete,
                size_bytes: 4096,
                modified: None,
                gate: Some(ReviewEntry {
                    verdict: Verdict::Pass,
                    total: 21,
                }),
            }],
            handoffs: Handoffs::default(),
            gate: Some(GateSummary { passed: 1, failed: 0 }),
            report: None,
        };

        let text = format_status(&snap);
        assert!(text.starts_with("  acme.test  [QUALITY GATE]\n"));
        assert!(text.contains("Type:     SaaS"));
        assert!(text.contains("seo-audit"));
        assert!(text.contains("62/100"));
        assert!(text.contains("4.0KB"));
        assert!(text.contains("PASS 21/25"));
        assert!(text.contains("Avg Score: 62"));
        assert!(text.contains("Quality Gate: PASS 1  FAIL 0  (100%)"));
    }
}
