//! Reconciliation of computed usage against GitHub billing.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{BillingSnapshot, RunnerOs, UsageByOs};

/// Signed per-OS difference, `reported - computed`.
///
/// Positive means billing reports more minutes than the workflow walk
/// found (e.g. deleted workflows or repositories outside the walk).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsDrift {
    /// Ubuntu difference.
    #[serde(rename = "UBUNTU")]
    pub ubuntu: i128,
    /// macOS difference.
    #[serde(rename = "MACOS")]
    pub macos: i128,
    /// Windows difference.
    #[serde(rename = "WINDOWS")]
    pub windows: i128,
}

impl OsDrift {
    /// Computes `reported - computed` for every runner class.
    pub fn between(reported: UsageByOs, computed: UsageByOs) -> Self {
        let diff = |os: RunnerOs| i128::from(reported.get(os)) - i128::from(computed.get(os));
        Self {
            ubuntu: diff(RunnerOs::Ubuntu),
            macos: diff(RunnerOs::Macos),
            windows: diff(RunnerOs::Windows),
        }
    }

    /// Difference for one runner class.
    pub fn get(&self, os: RunnerOs) -> i128 {
        match os {
            RunnerOs::Ubuntu => self.ubuntu,
            RunnerOs::Macos => self.macos,
            RunnerOs::Windows => self.windows,
        }
    }

    /// Returns true if both sides agree on every runner class.
    pub fn is_balanced(&self) -> bool {
        self.ubuntu == 0 && self.macos == 0 && self.windows == 0
    }
}

/// Organisation usage merged with the billing snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledUsage {
    /// `included_minutes - total_minutes_used`; negative when overdrawn.
    pub remaining_minutes: i64,
    /// Totals computed from the workflow walk.
    pub computed: UsageByOs,
    /// Per-OS breakdown reported by billing.
    pub reported: UsageByOs,
    /// `reported - computed`, per runner class.
    pub drift: OsDrift,
}

/// Merges computed organisation totals with the billing snapshot.
///
/// Billing stays authoritative: remaining minutes come from the snapshot
/// alone, and drift is reported rather than corrected.
pub fn reconcile(computed: UsageByOs, billing: &BillingSnapshot) -> ReconciledUsage {
    let drift = OsDrift::between(billing.minutes_used_breakdown, computed);
    if !drift.is_balanced() {
        warn!(
            ubuntu = %drift.ubuntu,
            macos = %drift.macos,
            windows = %drift.windows,
            "Billing breakdown differs from computed workflow usage"
        );
    }

    ReconciledUsage {
        remaining_minutes: billing.remaining_minutes(),
        computed,
        reported: billing.minutes_used_breakdown,
        drift,
    }
}
