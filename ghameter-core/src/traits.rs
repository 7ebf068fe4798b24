//! Trait definitions for GHAMeter collaborators.
//!
//! The aggregation core never talks to GitHub itself. These traits are the
//! seams an API client (or a test double) implements to feed it.

use crate::error::CoreError;
use crate::models::{BillingPeriod, BillingSnapshot, RepositoryUsage};

/// Lists the repositories of an organisation.
pub trait RepositoryLister: Send + Sync {
    /// Returns every repository name, in a stable order.
    fn list_repositories(
        &self,
        org: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>, CoreError>> + Send;
}

/// Reports the current billing cycle.
pub trait BillingPeriodSource: Send + Sync {
    /// Fetches how many days are left in the current billing cycle.
    fn billing_period(
        &self,
        org: &str,
    ) -> impl std::future::Future<Output = Result<BillingPeriod, CoreError>> + Send;
}

/// Produces per-workflow usage for a repository.
///
/// Each call either returns a fully built repository or fails; a partially
/// filled repository is never handed back.
pub trait WorkflowUsageSource: Send + Sync {
    /// Collects the workflows of `repo` into a [`RepositoryUsage`].
    fn repository_usage(
        &self,
        org: &str,
        repo: &str,
    ) -> impl std::future::Future<Output = Result<RepositoryUsage, CoreError>> + Send;
}

/// Produces the organisation's billing snapshot.
pub trait BillingSource: Send + Sync {
    /// Fetches the authoritative Actions billing figures.
    fn billing_snapshot(
        &self,
        org: &str,
    ) -> impl std::future::Future<Output = Result<BillingSnapshot, CoreError>> + Send;
}

/// Everything an audit run needs from upstream.
pub trait UsageSource:
    RepositoryLister + BillingPeriodSource + WorkflowUsageSource + BillingSource
{
}

impl<T> UsageSource for T where
    T: RepositoryLister + BillingPeriodSource + WorkflowUsageSource + BillingSource
{
}

/// Named string outputs consumed by the invoking process.
pub trait OutputSink {
    /// Publishes `value` under `name`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Output` if the value could not be written.
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), CoreError>;
}
