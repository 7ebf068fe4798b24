//! JSON output formatting.

use anyhow::Result;
use chrono::NaiveDateTime;
use ghameter_core::{
    AlarmLimits, AlarmState, AuditReport, BillingSnapshot, OsDrift, RepositoryUsage, UsageByOs,
};
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// JSON document for one audit run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditOutput<'a> {
    pub organisation: &'a str,
    pub generated_at: String,
    pub repositories: Vec<RepositoryOutput<'a>>,
    pub totals: UsageByOs,
    pub repositories_processed: usize,
    pub billing: &'a BillingSnapshot,
    pub remaining_minutes: i64,
    pub drift: OsDrift,
    pub days_left_in_cycle: i64,
    pub limits: &'a AlarmLimits,
    pub alarm: &'a AlarmState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// A listed repository.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryOutput<'a> {
    pub name: &'a str,
    pub usage: UsageByOs,
    pub workflows: Vec<WorkflowOutput<'a>>,
}

/// One workflow's minutes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowOutput<'a> {
    pub name: &'a str,
    pub usage: UsageByOs,
}

impl<'a> From<&'a RepositoryUsage> for RepositoryOutput<'a> {
    fn from(repo: &'a RepositoryUsage) -> Self {
        Self {
            name: repo.name(),
            usage: repo.usage(),
            workflows: repo
                .actions()
                .iter()
                .map(|w| WorkflowOutput {
                    name: w.name(),
                    usage: w.usage(),
                })
                .collect(),
        }
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats an audit report together with its alarm outcome.
    pub fn format_report(
        &self,
        report: &AuditReport,
        limits: &AlarmLimits,
        state: &AlarmState,
        generated_at: NaiveDateTime,
    ) -> Result<String> {
        self.format(&Self::report_to_output(report, limits, state, generated_at))
    }

    /// Converts a report to its output shape.
    pub fn report_to_output<'a>(
        report: &'a AuditReport,
        limits: &'a AlarmLimits,
        state: &'a AlarmState,
        generated_at: NaiveDateTime,
    ) -> AuditOutput<'a> {
        AuditOutput {
            organisation: &report.organisation,
            generated_at: generated_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            repositories: report
                .usage
                .repositories
                .iter()
                .map(RepositoryOutput::from)
                .collect(),
            totals: report.usage.totals,
            repositories_processed: report.usage.repositories_processed,
            billing: &report.billing,
            remaining_minutes: report.reconciled.remaining_minutes,
            drift: report.reconciled.drift,
            days_left_in_cycle: report.period.days_left,
            limits,
            alarm: state,
            failure_reason: state.message(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
