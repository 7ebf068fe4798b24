//! Config command - inspect the resolved configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::info;

use crate::config::{AuditConfig, ALL_VARIABLES};
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the configuration an audit would run with.
    Show,

    /// List the environment variables that are read.
    Env,
}

/// Runs the config command.
pub fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli),
        ConfigAction::Env => show_env(cli),
    }
}

fn show_config(cli: &Cli) -> Result<()> {
    let config = AuditConfig::from_env(&cli.overrides)?;
    info!(organisation = %config.organisation, "Configuration is valid");

    match cli.format {
        OutputFormat::Text => {
            let paid = if config.limits().paid_check_enabled() {
                config.paid_usage_limit.to_string()
            } else {
                "disabled".to_string()
            };
            let output = config.github_output.as_ref().map_or_else(
                || "not set (failure reason is only logged)".to_string(),
                |p| p.display().to_string(),
            );

            println!("GHAMeter Configuration");
            println!("{}", "─".repeat(40));
            println!();
            let token = if config.token.is_some() { "set" } else { "missing" };
            let rows = [
                ("Organisation", config.organisation.clone()),
                (
                    "Skip repos without usage",
                    config.skip_repos_without_usage.to_string(),
                ),
                (
                    "Remaining minutes alarm",
                    config.remaining_minutes_threshold.to_string(),
                ),
                ("Paid usage limit", paid),
                ("API URL", config.api_url.clone()),
                ("Token", token.to_string()),
                ("Step output file", output),
            ];
            for (label, value) in rows {
                println!("{:<26}{value}", format!("{label}:"));
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            let mut value = serde_json::to_value(&config)?;
            if let Some(object) = value.as_object_mut() {
                object.insert(
                    "tokenSet".to_string(),
                    serde_json::Value::Bool(config.token.is_some()),
                );
            }
            println!("{}", formatter.format(&value)?);
        }
    }

    Ok(())
}

fn show_env(cli: &Cli) -> Result<()> {
    let present: Vec<(&str, bool)> = ALL_VARIABLES
        .iter()
        .map(|key| {
            let set = std::env::var(key).is_ok_and(|v| !v.trim().is_empty());
            (*key, set)
        })
        .collect();

    match cli.format {
        OutputFormat::Text => {
            println!("Environment Variables");
            println!("{}", "─".repeat(40));
            println!();
            for (key, set) in &present {
                println!("{key:<34} {}", if *set { "set" } else { "-" });
            }
        }
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = present
                .iter()
                .map(|(key, set)| ((*key).to_string(), serde_json::Value::Bool(*set)))
                .collect();
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&map)?);
        }
    }

    Ok(())
}
