//! auditbook CLI: marketing audit report builder.
//!
//! Assembles the markdown reports in an audit directory into one HTML
//! document, prints it to PDF and reports audit progress.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
