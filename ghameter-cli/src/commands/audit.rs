//! Audit command - aggregate usage, report it, and enforce thresholds.

use anyhow::{Context, Result};
use chrono::Local;
use ghameter_core::{enforce, run_audit};
use ghameter_fetch::GitHubClient;
use tracing::info;

use crate::config::AuditConfig;
use crate::github_output::output_sink;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the audit command.
///
/// The report is always printed before thresholds are enforced, so a
/// breached run still shows where the minutes went.
pub async fn run(cli: &Cli) -> Result<()> {
    let config = AuditConfig::from_env(&cli.overrides)?;
    let token = config.require_token()?;
    let client = GitHubClient::with_base_url(&config.api_url, token)
        .with_context(|| format!("Failed to create API client for {}", config.api_url))?;

    info!(
        organisation = %config.organisation,
        api_url = %client.base_url(),
        "Starting usage audit"
    );

    let report = run_audit(&client, &config.organisation, config.policy()).await?;
    let limits = config.limits();
    let state = report.evaluate(&limits);
    let generated_at = Local::now().naive_local();

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!(
                "{}",
                formatter.format_report(&report, &limits, &state, generated_at)
            );
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!(
                "{}",
                formatter.format_report(&report, &limits, &state, generated_at)?
            );
        }
    }

    let mut sink = output_sink(config.github_output.as_deref());
    enforce(state, &mut *sink)?;
    Ok(())
}
