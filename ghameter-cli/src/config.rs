//! Run configuration.
//!
//! Settings come from the environment using the GitHub Action `INPUT_*`
//! convention, and any of them can be overridden from the command line.
//! Everything is validated before the first API call.

use std::path::PathBuf;

use clap::Args;
use ghameter_core::{AlarmLimits, CoreError, InclusionPolicy};
use ghameter_fetch::DEFAULT_API_URL;
use serde::Serialize;
use tracing::debug;

// ============================================================================
// Environment Variables
// ============================================================================

/// Organisation to audit.
pub const ENV_ORGANISATION: &str = "INPUT_ORGANISATION";
/// Hide repositories with zero usage from the report.
pub const ENV_SKIP_REPOS_WITHOUT_USAGE: &str = "INPUT_SKIPREPOSWITHOUTUSAGE";
/// Alarm when fewer included minutes than this remain.
pub const ENV_REMAINING_MINUTES: &str = "INPUT_RAISEALARMREMAININGMINUTES";
/// Alarm when paid minutes exceed this limit.
pub const ENV_PAID_USAGE_LIMIT: &str = "INPUT_RAISEALARMONPAIDUSAGELIMIT";
/// Token passed as an action input.
pub const ENV_INPUT_TOKEN: &str = "INPUT_GITHUBTOKEN";
/// Token fallback.
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
/// API root (GitHub Enterprise).
pub const ENV_API_URL: &str = "GITHUB_API_URL";
/// File the runner reads step outputs from.
pub const ENV_GITHUB_OUTPUT: &str = "GITHUB_OUTPUT";

/// Every variable the audit reads, in display order.
pub const ALL_VARIABLES: [&str; 8] = [
    ENV_ORGANISATION,
    ENV_SKIP_REPOS_WITHOUT_USAGE,
    ENV_REMAINING_MINUTES,
    ENV_PAID_USAGE_LIMIT,
    ENV_INPUT_TOKEN,
    ENV_GITHUB_TOKEN,
    ENV_API_URL,
    ENV_GITHUB_OUTPUT,
];

// ============================================================================
// Command-line Overrides
// ============================================================================

/// Flags that take precedence over the environment.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// Organisation to audit (overrides INPUT_ORGANISATION).
    #[arg(long, global = true)]
    pub organisation: Option<String>,

    /// Hide repositories without usage: true/false (overrides INPUT_SKIPREPOSWITHOUTUSAGE).
    #[arg(long, global = true, value_name = "BOOL", value_parser = parse_bool_arg)]
    pub skip_repos_without_usage: Option<bool>,

    /// Remaining-minutes alarm threshold (overrides INPUT_RAISEALARMREMAININGMINUTES).
    #[arg(long, global = true, value_name = "MINUTES", allow_negative_numbers = true)]
    pub remaining_minutes_threshold: Option<i64>,

    /// Paid-minutes alarm limit, 0 disables (overrides INPUT_RAISEALARMONPAIDUSAGELIMIT).
    #[arg(long, global = true, value_name = "MINUTES", allow_negative_numbers = true)]
    pub paid_usage_limit: Option<i64>,
}

fn parse_bool_arg(value: &str) -> Result<bool, String> {
    parse_bool(value).ok_or_else(|| format!("expected true/false, got '{value}'"))
}

// ============================================================================
// Audit Config
// ============================================================================

/// Fully resolved settings for one audit run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    /// Organisation to audit.
    pub organisation: String,
    /// Hide repositories without usage from the report.
    pub skip_repos_without_usage: bool,
    /// Remaining-minutes alarm threshold.
    pub remaining_minutes_threshold: i64,
    /// Paid-minutes alarm limit; zero or negative disables it.
    pub paid_usage_limit: i64,
    /// API token.
    #[serde(skip)]
    pub token: Option<String>,
    /// API root.
    pub api_url: String,
    /// Step output file, if running under Actions.
    pub github_output: Option<PathBuf>,
}

impl AuditConfig {
    /// Resolves configuration from the process environment and `overrides`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidConfig` if a value is missing or malformed.
    pub fn from_env(overrides: &ConfigOverrides) -> Result<Self, CoreError> {
        Self::resolve(|key| std::env::var(key).ok(), overrides)
    }

    /// Resolves configuration from `lookup` and `overrides`.
    ///
    /// Empty variables count as unset, since Actions passes every declared
    /// input even when the workflow leaves it blank.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidConfig` if a value is missing or malformed.
    pub fn resolve<F>(lookup: F, overrides: &ConfigOverrides) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let organisation = overrides
            .organisation
            .clone()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .or_else(|| var(ENV_ORGANISATION))
            .ok_or_else(|| {
                CoreError::InvalidConfig(format!(
                    "{ENV_ORGANISATION} is not set (or pass --organisation)"
                ))
            })?;

        let skip_repos_without_usage = match overrides.skip_repos_without_usage {
            Some(skip) => skip,
            None => var(ENV_SKIP_REPOS_WITHOUT_USAGE)
                .map(|v| {
                    parse_bool(&v).ok_or_else(|| {
                        CoreError::InvalidConfig(format!(
                            "{ENV_SKIP_REPOS_WITHOUT_USAGE} must be true or false, got '{v}'"
                        ))
                    })
                })
                .transpose()?
                .unwrap_or(false),
        };

        let remaining_minutes_threshold = match overrides.remaining_minutes_threshold {
            Some(threshold) => threshold,
            None => parse_minutes(ENV_REMAINING_MINUTES, var(ENV_REMAINING_MINUTES))?,
        };

        let paid_usage_limit = match overrides.paid_usage_limit {
            Some(limit) => limit,
            None => parse_minutes(ENV_PAID_USAGE_LIMIT, var(ENV_PAID_USAGE_LIMIT))?,
        };
        if paid_usage_limit < 0 {
            debug!(paid_usage_limit, "Negative paid usage limit, paid check disabled");
        }

        let config = Self {
            organisation,
            skip_repos_without_usage,
            remaining_minutes_threshold,
            paid_usage_limit,
            token: var(ENV_INPUT_TOKEN).or_else(|| var(ENV_GITHUB_TOKEN)),
            api_url: var(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            github_output: var(ENV_GITHUB_OUTPUT).map(PathBuf::from),
        };

        debug!(
            organisation = %config.organisation,
            skip_repos_without_usage = config.skip_repos_without_usage,
            remaining_minutes_threshold = config.remaining_minutes_threshold,
            paid_usage_limit = config.paid_usage_limit,
            api_url = %config.api_url,
            "Configuration resolved"
        );
        Ok(config)
    }

    /// The API token.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidConfig` if no token was provided.
    pub fn require_token(&self) -> Result<&str, CoreError> {
        self.token.as_deref().ok_or_else(|| {
            CoreError::InvalidConfig(format!(
                "no API token: set {ENV_INPUT_TOKEN} or {ENV_GITHUB_TOKEN}"
            ))
        })
    }

    /// Which repositories the report lists.
    pub fn policy(&self) -> InclusionPolicy {
        InclusionPolicy {
            skip_repos_without_usage: self.skip_repos_without_usage,
        }
    }

    /// Alarm thresholds.
    pub fn limits(&self) -> AlarmLimits {
        AlarmLimits {
            paid_usage_limit: self.paid_usage_limit,
            remaining_minutes_threshold: self.remaining_minutes_threshold,
        }
    }
}

/// Parses a boolean flag: `true/false`, `1/0`, `yes/no`, any case.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Parses a minute count, defaulting to zero when unset.
fn parse_minutes(key: &str, value: Option<String>) -> Result<i64, CoreError> {
    value.map_or(Ok(0), |v| {
        v.parse().map_err(|_| {
            CoreError::InvalidConfig(format!("{key} must be a whole number of minutes, got '{v}'"))
        })
    })
}

// ============================================================================
// Tests
// ============================================================================
