//! Ensaio CLI: run and inspect step scripts.
//!
//! ```bash
//! ensaio check flows/sales-confirm.yaml     # validate a script offline
//! ensaio run flows/sales-confirm.yaml       # drive a real browser
//! ensaio run flows/sales-confirm.yaml --json > report.json
//! ```

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI-level errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Engine failure
    #[error(transparent)]
    Engine(#[from] ensaio::EnsaioError),

    /// The run executed but did not pass
    #[error("run failed: {0}")]
    RunFailed(String),

    /// Feature not compiled in
    #[error("{0}")]
    Unsupported(String),
}

/// Step-driven browser testing for the ERP web client
#[derive(Debug, Parser)]
#[command(name = "ensaio", version, about)]
pub struct Cli {
    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse and validate a script without touching a browser
    Check(CheckArgs),
    /// Execute a script against a live browser
    Run(RunArgs),
}

/// Arguments for `check`
#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// Script file
    pub script: PathBuf,
}

/// Arguments for `run`
#[derive(Debug, clap::Args)]
pub struct RunArgs {
    /// Script file
    pub script: PathBuf,

    /// Address opened before the first step (overrides the script)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Directory for diagnostic artifacts
    #[arg(long, default_value = "ensaio-artifacts")]
    pub artifacts: PathBuf,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Disable the chromium sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Explicit chromium binary
    #[arg(long, env = "CHROMIUM_PATH")]
    pub chromium_path: Option<String>,

    /// Print the report as JSON instead of the summary
    #[arg(long)]
    pub json: bool,
}

/// Initialize tracing from `ENSAIO_LOG` (falls back to warnings only)
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("ENSAIO_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn,ensaio=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
