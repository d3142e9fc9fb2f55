//! auditbook dashboard: live terminal view of a running marketing audit.
//!
//! Polls the audit directory and redraws progress, agent scores and the
//! quality gate with `ratatui` + `crossterm`.

mod app;
mod view;
mod widgets;

use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};

use auditbook_shared::{load_config, load_config_from};

/// Live dashboard for an audit directory.
#[derive(Parser)]
#[command(
    name = "auditbook-dashboard",
    version,
    about = "Live terminal dashboard for a marketing audit directory.",
    long_about = None,
)]
struct Args {
    /// Audit directory, e.g. /tmp/marketing-audit-example.com.
    dir: PathBuf,

    /// Config file (defaults to ~/.auditbook/auditbook.toml).
    #[arg(short, long, env = "AUDITBOOK_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_tracing()?;

    let config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    app::run(args.dir, config)
}

/// Log to the file named by `AUDITBOOK_LOG`; the terminal belongs to the UI.
fn init_tracing() -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let Some(path) = std::env::var_os("AUDITBOOK_LOG") else {
        return Ok(());
    };
    let file = std::fs::File::options()
        .create(true)
        .append(true)
        .open(&path)
        .wrap_err_with(|| format!("failed to open log file {}", PathBuf::from(&path).display()))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("auditbook=debug"));

    fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
