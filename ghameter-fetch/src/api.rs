//! GitHub REST payloads and their conversion into core types.
//!
//! Conversion is where raw data meets the core's invariants: unknown runner
//! classes are skipped with a warning and negative counts are rejected.

use std::collections::BTreeMap;

use ghameter_core::{BillingPeriod, BillingSnapshot, CoreError, RunnerOs, UsageByOs};
use serde::Deserialize;
use tracing::warn;

/// Milliseconds per billed minute.
const MS_PER_MINUTE: u64 = 60_000;

// ============================================================================
// Repositories & Workflows
// ============================================================================

/// One entry from `GET /orgs/{org}/repos`.
#[derive(Debug, Deserialize)]
pub struct RepositoryResponse {
    /// Repository name (without owner).
    pub name: String,
}

/// Response from `GET /repos/{owner}/{repo}/actions/workflows`.
#[derive(Debug, Deserialize)]
pub struct WorkflowsResponse {
    /// Workflows on this page.
    #[serde(default)]
    pub workflows: Vec<WorkflowResponse>,
}

/// A workflow definition.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowResponse {
    /// Workflow ID.
    pub id: u64,
    /// Display name.
    pub name: String,
}

/// Response from `GET /repos/{owner}/{repo}/actions/workflows/{id}/timing`.
#[derive(Debug, Deserialize)]
pub struct WorkflowTimingResponse {
    /// Billable time keyed by runner class.
    #[serde(default)]
    pub billable: BTreeMap<String, BillableTiming>,
}

/// Billable time for one runner class.
#[derive(Debug, Deserialize)]
pub struct BillableTiming {
    /// Total billable milliseconds this cycle.
    #[serde(default)]
    pub total_ms: i64,
}

impl WorkflowTimingResponse {
    /// Converts billable milliseconds into whole minutes per runner class.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if a timing is negative.
    pub fn to_usage(&self, workflow: &str) -> Result<UsageByOs, CoreError> {
        for key in self.billable.keys() {
            if RunnerOs::from_key(key).is_none() {
                warn!(workflow = %workflow, runner = %key, "Ignoring unknown runner class");
            }
        }

        let total_ms = |os: RunnerOs| self.billable.get(os.key()).map_or(0, |t| t.total_ms);
        let ms = UsageByOs::from_signed(
            total_ms(RunnerOs::Ubuntu),
            total_ms(RunnerOs::Macos),
            total_ms(RunnerOs::Windows),
        )
        .map_err(|e| CoreError::InvalidData(format!("workflow {workflow} billable time: {e}")))?;
        Ok(ms.map(ms_to_minutes))
    }
}

/// Converts billable milliseconds to minutes, rounding partial minutes up.
pub fn ms_to_minutes(ms: u64) -> u64 {
    ms.div_ceil(MS_PER_MINUTE)
}

// ============================================================================
// Billing
// ============================================================================

/// Response from `GET /orgs/{org}/settings/billing/actions`.
#[derive(Debug, Deserialize)]
pub struct ActionsBillingResponse {
    /// Minutes used this cycle.
    pub total_minutes_used: f64,
    /// Paid minutes used this cycle.
    #[serde(default)]
    pub total_paid_minutes_used: f64,
    /// Minutes included in the plan.
    pub included_minutes: f64,
    /// Minutes used per runner class.
    #[serde(default)]
    pub minutes_used_breakdown: BTreeMap<String, f64>,
}

impl ActionsBillingResponse {
    /// Converts to a [`BillingSnapshot`].
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` for negative or non-finite figures.
    pub fn to_snapshot(&self) -> Result<BillingSnapshot, CoreError> {
        for key in self.minutes_used_breakdown.keys() {
            if RunnerOs::from_key(key).is_none() {
                warn!(runner = %key, "Ignoring unknown runner class in billing breakdown");
            }
        }

        let minutes = |os: RunnerOs| {
            self.minutes_used_breakdown
                .get(os.key())
                .map_or(Ok(0), |m| whole_minutes(os.key(), *m))
        };
        let breakdown = UsageByOs::from_signed(
            minutes(RunnerOs::Ubuntu)?,
            minutes(RunnerOs::Macos)?,
            minutes(RunnerOs::Windows)?,
        )?;

        Ok(BillingSnapshot {
            included_minutes: whole_minutes("included_minutes", self.included_minutes)?,
            total_minutes_used: whole_minutes("total_minutes_used", self.total_minutes_used)?,
            total_paid_minutes_used: whole_minutes(
                "total_paid_minutes_used",
                self.total_paid_minutes_used,
            )?,
            minutes_used_breakdown: breakdown,
        })
    }
}

/// Response from `GET /orgs/{org}/settings/billing/shared-storage`.
#[derive(Debug, Deserialize)]
pub struct SharedStorageResponse {
    /// Days until the billing cycle resets.
    pub days_left_in_billing_cycle: i64,
}

impl SharedStorageResponse {
    /// Converts to a [`BillingPeriod`].
    pub fn to_period(&self) -> BillingPeriod {
        BillingPeriod {
            days_left: self.days_left_in_billing_cycle,
        }
    }
}

/// Rounds a billing figure to whole minutes, rejecting negatives.
#[allow(clippy::cast_possible_truncation)]
fn whole_minutes(field: &str, value: f64) -> Result<i64, CoreError> {
    if !value.is_finite() || value < 0.0 || value > i64::MAX as f64 {
        return Err(CoreError::InvalidData(format!(
            "{field} has invalid minute count {value}"
        )));
    }
    Ok(value.round() as i64)
}

// ============================================================================
// Tests
// ============================================================================
