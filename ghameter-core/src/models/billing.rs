//! Billing figures reported by GitHub.
//!
//! - [`BillingSnapshot`] - Authoritative Actions billing for the organisation
//! - [`BillingPeriod`] - Position in the current billing cycle

use serde::{Deserialize, Serialize};

use super::usage::UsageByOs;

/// Actions billing for the current cycle, as reported by GitHub.
///
/// Treated as ground truth; nothing in this crate derives or adjusts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingSnapshot {
    /// Minutes included in the plan.
    pub included_minutes: i64,
    /// Minutes used so far this cycle.
    pub total_minutes_used: i64,
    /// Minutes billed beyond the included allowance.
    pub total_paid_minutes_used: i64,
    /// Minutes used, per runner class.
    pub minutes_used_breakdown: UsageByOs,
}

impl BillingSnapshot {
    /// Included minutes left in the cycle. Negative once overdrawn.
    pub fn remaining_minutes(&self) -> i64 {
        self.included_minutes - self.total_minutes_used
    }
}

/// Days remaining in the current billing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingPeriod {
    /// Days until included minutes reset.
    pub days_left: i64,
}
