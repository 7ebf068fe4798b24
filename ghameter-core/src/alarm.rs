//! Threshold evaluation.
//!
//! At most one alarm fires per run. The paid-usage check runs first: paid
//! minutes only accrue once the included allowance is gone, so that alarm
//! subsumes the remaining-minutes one.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::CoreError;
use crate::models::BillingSnapshot;
use crate::reconcile::ReconciledUsage;
use crate::traits::OutputSink;

/// Name of the output that carries the alarm message.
pub const FAILURE_REASON_OUTPUT: &str = "failure-reason";

/// Configured alarm limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmLimits {
    /// Paid minutes allowed before alarming. Zero or negative disables the check.
    pub paid_usage_limit: i64,
    /// Alarm when fewer included minutes than this remain.
    pub remaining_minutes_threshold: i64,
}

impl AlarmLimits {
    /// Returns true if the paid-usage check is active.
    pub fn paid_check_enabled(&self) -> bool {
        self.paid_usage_limit > 0
    }
}

/// Outcome of threshold evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum AlarmState {
    /// No threshold breached.
    #[default]
    None,
    /// Remaining included minutes fell below the threshold.
    #[serde(rename_all = "camelCase")]
    RemainingMinutesThresholdBreached {
        /// Included minutes left.
        remaining_minutes: i64,
        /// Configured threshold.
        threshold: i64,
    },
    /// Paid minutes exceeded the configured limit.
    #[serde(rename_all = "camelCase")]
    PaidMinutesThresholdBreached {
        /// Configured limit.
        limit: i64,
        /// Paid minutes used.
        paid_minutes: i64,
    },
}

impl AlarmState {
    /// The error this state terminates the run with, if any.
    pub fn to_error(&self) -> Option<CoreError> {
        match *self {
            AlarmState::None => None,
            AlarmState::RemainingMinutesThresholdBreached {
                remaining_minutes, ..
            } => Some(CoreError::RemainingMinutesThresholdBreached { remaining_minutes }),
            AlarmState::PaidMinutesThresholdBreached {
                limit,
                paid_minutes,
            } => Some(CoreError::PaidMinutesThresholdBreached {
                limit,
                paid_minutes,
            }),
        }
    }

    /// Human-readable reason, if an alarm fired.
    pub fn message(&self) -> Option<String> {
        self.to_error().map(|e| e.to_string())
    }
}

/// Evaluates the limits against reconciled usage. First match wins.
pub fn evaluate(
    reconciled: &ReconciledUsage,
    billing: &BillingSnapshot,
    limits: &AlarmLimits,
) -> AlarmState {
    if limits.paid_check_enabled() && billing.total_paid_minutes_used > limits.paid_usage_limit {
        return AlarmState::PaidMinutesThresholdBreached {
            limit: limits.paid_usage_limit,
            paid_minutes: billing.total_paid_minutes_used,
        };
    }

    if reconciled.remaining_minutes < limits.remaining_minutes_threshold {
        return AlarmState::RemainingMinutesThresholdBreached {
            remaining_minutes: reconciled.remaining_minutes,
            threshold: limits.remaining_minutes_threshold,
        };
    }

    AlarmState::None
}

/// Publishes the alarm reason and fails the run.
///
/// The reason is written to `sink` before the error is returned so
/// automated callers never have to parse logs.
///
/// # Errors
///
/// Returns the breach variant of [`CoreError`] when `state` is an alarm.
/// A sink failure is logged and never replaces the breach.
pub fn enforce<S: OutputSink + ?Sized>(state: AlarmState, sink: &mut S) -> Result<(), CoreError> {
    let Some(error) = state.to_error() else {
        info!("No usage thresholds breached");
        return Ok(());
    };

    let message = error.to_string();
    warn!(reason = %message, "Usage threshold breached");
    if let Err(sink_error) = sink.set_output(FAILURE_REASON_OUTPUT, &message) {
        error!(error = %sink_error, reason = %message, "Failed to publish failure reason");
    }
    Err(error)
}

// ============================================================================
// Tests
// ============================================================================
