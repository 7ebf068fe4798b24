//! Core error types for `GHAMeter`.

use thiserror::Error;

use crate::models::UsageByOs;

/// Core error type for `GHAMeter` operations.
///
/// Threshold breaches are expected outcomes of an audit run rather than
/// faults, but they still terminate the run. They get their own variants so
/// callers can branch on them without inspecting message text.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid or missing configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid usage data (negative or overflowing minute counts).
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Repository-summed and workflow-summed organisation totals disagree.
    #[error(
        "Aggregation mismatch: repositories sum to {repository_total}, workflows sum to {workflow_total}"
    )]
    AggregationMismatch {
        /// Total derived from per-repository usage.
        repository_total: UsageByOs,
        /// Total derived from per-workflow usage.
        workflow_total: UsageByOs,
    },

    /// Paid minutes exceeded the configured paid-usage limit.
    #[error(
        "Your organisation has hit the user-defined limit of {limit} paid minutes by using a total of {paid_minutes} paid minutes"
    )]
    PaidMinutesThresholdBreached {
        /// Configured paid-usage limit.
        limit: i64,
        /// Paid minutes reported by billing.
        paid_minutes: i64,
    },

    /// Remaining included minutes dropped below the alarm threshold.
    #[error("Your organisation is running short on minutes, you have {remaining_minutes} left")]
    RemainingMinutesThresholdBreached {
        /// Included minutes left in the billing cycle.
        remaining_minutes: i64,
    },

    /// A collaborator (API client, lister) failed.
    #[error("Upstream error: {0}")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The failure-reason output channel could not be written.
    #[error("Output error: {0}")]
    Output(String),
}

impl CoreError {
    /// Returns true if this error is a threshold breach.
    pub fn is_threshold_breach(&self) -> bool {
        matches!(
            self,
            CoreError::PaidMinutesThresholdBreached { .. }
                | CoreError::RemainingMinutesThresholdBreached { .. }
        )
    }

    /// Wraps any collaborator error, keeping the original as the source.
    pub fn upstream<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CoreError::Upstream(Box::new(err))
    }
}
