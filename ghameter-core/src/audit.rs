//! Audit run orchestration.
//!
//! Drives the collaborators strictly in sequence: list repositories, read
//! the billing period, collect each repository in lister order, then fetch
//! billing and reconcile.

use serde::Serialize;
use tracing::{info, instrument};

use crate::aggregate::{InclusionPolicy, OrganizationAggregator, OrganizationUsage};
use crate::alarm::{evaluate, AlarmLimits, AlarmState};
use crate::error::CoreError;
use crate::models::{BillingPeriod, BillingSnapshot};
use crate::reconcile::{reconcile, ReconciledUsage};
use crate::traits::UsageSource;

/// Everything gathered by one audit run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    /// Organisation that was audited.
    pub organisation: String,
    /// Aggregated workflow usage.
    pub usage: OrganizationUsage,
    /// Billing figures reported by GitHub.
    pub billing: BillingSnapshot,
    /// Current billing cycle.
    pub period: BillingPeriod,
    /// Computed usage merged with billing.
    pub reconciled: ReconciledUsage,
}

impl AuditReport {
    /// Evaluates alarm limits against this report.
    pub fn evaluate(&self, limits: &AlarmLimits) -> AlarmState {
        evaluate(&self.reconciled, &self.billing, limits)
    }
}

/// Runs a full audit of `org`.
///
/// # Errors
///
/// Propagates collaborator failures unchanged, and returns
/// `CoreError::AggregationMismatch` if the cross-check fails.
#[instrument(skip(source, policy))]
pub async fn run_audit<S: UsageSource>(
    source: &S,
    org: &str,
    policy: InclusionPolicy,
) -> Result<AuditReport, CoreError> {
    info!("*************** Getting repos for {org} ***************");
    let repo_names = source.list_repositories(org).await?;
    let period = source.billing_period(org).await?;

    let mut aggregator = OrganizationAggregator::new(policy);
    for repo_name in &repo_names {
        info!("*************** Repo Name {repo_name} ***************");
        let repo = source.repository_usage(org, repo_name).await?;
        info!("*************** Repo Usage Summary {} ***************", repo.usage());
        aggregator = aggregator.fold(repo)?;
    }

    let usage = aggregator.finish()?;
    info!("*************** Total Costs: {} ***************", usage.totals);

    let billing = source.billing_snapshot(org).await?;
    let reconciled = reconcile(usage.totals, &billing);

    Ok(AuditReport {
        organisation: org.to_string(),
        usage,
        billing,
        period,
        reconciled,
    })
}
