// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! GHAMeter CLI - GitHub Actions minutes auditing from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Audit the organisation named by INPUT_ORGANISATION
//! ghameter
//!
//! # Audit a specific organisation, hiding repositories without usage
//! ghameter --organisation acme --skip-repos-without-usage true
//!
//! # Alarm below 500 remaining minutes or above 100 paid minutes
//! ghameter --remaining-minutes-threshold 500 --paid-usage-limit 100
//!
//! # JSON output
//! ghameter --format json --pretty
//!
//! # Show the resolved configuration
//! ghameter config show
//! ```

mod commands;
mod config;
mod github_output;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use ghameter_core::CoreError;
use ghameter_fetch::FetchError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{audit, config as config_cmd};
use config::ConfigOverrides;

// ============================================================================
// CLI Definition
// ============================================================================

/// GHAMeter CLI - GitHub Actions usage auditing.
#[derive(Parser)]
#[command(name = "ghameter")]
#[command(about = "GitHub Actions minutes auditing CLI")]
#[command(long_about = r#"
GHAMeter totals GitHub Actions minutes per workflow, repository and
organisation, compares them with GitHub's billing figures, and fails
when a usage threshold is breached.

Settings are read from the environment (GitHub Action inputs):
  INPUT_ORGANISATION                 Organisation to audit
  INPUT_SKIPREPOSWITHOUTUSAGE        Hide repositories without usage
  INPUT_RAISEALARMREMAININGMINUTES   Alarm below this many remaining minutes
  INPUT_RAISEALARMONPAIDUSAGELIMIT   Alarm above this many paid minutes (0 = off)
  INPUT_GITHUBTOKEN / GITHUB_TOKEN   API token
  GITHUB_API_URL                     API root (GitHub Enterprise)
  GITHUB_OUTPUT                      Step output file for the failure reason

Exit codes:
  0  no threshold breached
  1  error talking to GitHub
  2  invalid configuration
  3  inconsistent usage data
  4  remaining minutes below threshold
  5  paid minutes above limit
"#)]
#[command(version)]
#[command(author = "GHAMeter Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, runs 'audit' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (no logging).
    #[arg(long, short, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Audit usage and enforce thresholds (default if no command specified).
    #[command(visible_alias = "a")]
    Audit,

    /// Inspect configuration.
    Config(config_cmd::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General or upstream error.
    Error = 1,
    /// Missing or malformed configuration.
    ConfigError = 2,
    /// Usage totals failed a consistency check.
    DataError = 3,
    /// Remaining included minutes below threshold.
    RemainingMinutesBreached = 4,
    /// Paid minutes above limit.
    PaidMinutesBreached = 5,
}

impl ExitCode {
    /// Chooses the exit code for a failed run.
    pub fn for_error(error: &anyhow::Error) -> Self {
        if let Some(core) = error.downcast_ref::<CoreError>() {
            return match core {
                CoreError::InvalidConfig(_) => ExitCode::ConfigError,
                CoreError::InvalidData(_) | CoreError::AggregationMismatch { .. } => {
                    ExitCode::DataError
                }
                CoreError::RemainingMinutesThresholdBreached { .. } => {
                    ExitCode::RemainingMinutesBreached
                }
                CoreError::PaidMinutesThresholdBreached { .. } => ExitCode::PaidMinutesBreached,
                CoreError::Upstream(_) | CoreError::Output(_) => ExitCode::Error,
            };
        }
        match error.downcast_ref::<FetchError>() {
            Some(FetchError::InvalidUrl(_)) => ExitCode::ConfigError,
            _ => ExitCode::Error,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("ghameter=debug,info")
    } else {
        EnvFilter::new("ghameter=info")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Config(args)) => config_cmd::run(args, &cli),
        Some(Commands::Audit) | None => audit::run(&cli).await,
    };

    if let Err(e) = result {
        let code = ExitCode::for_error(&e);
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(code as i32);
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
