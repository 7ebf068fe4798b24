//! [`GitHubClient`] as the upstream for an audit run.

use ghameter_core::{
    BillingPeriod, BillingPeriodSource, BillingSnapshot, BillingSource, CoreError,
    RepositoryLister, RepositoryUsage, WorkflowUsage, WorkflowUsageSource,
};
use tracing::{debug, instrument};

use crate::api::{
    ActionsBillingResponse, RepositoryResponse, SharedStorageResponse, WorkflowTimingResponse,
    WorkflowsResponse,
};
use crate::client::GitHubClient;

/// Page size for list endpoints (GitHub's maximum).
const PER_PAGE: u32 = 100;

impl GitHubClient {
    /// Lists repository names for `org`, sorted by full name.
    #[instrument(skip(self))]
    pub async fn fetch_repository_names(&self, org: &str) -> Result<Vec<String>, crate::FetchError> {
        let path =
            format!("orgs/{org}/repos?type=all&sort=full_name&direction=asc&per_page={PER_PAGE}");
        let repos = self
            .get_all_pages(&path, |page: Vec<RepositoryResponse>| page)
            .await?;
        debug!(count = repos.len(), "Listed repositories");
        Ok(repos.into_iter().map(|r| r.name).collect())
    }

    /// Collects billable minutes for every workflow in `repo`.
    #[instrument(skip(self))]
    pub async fn fetch_repository_usage(
        &self,
        org: &str,
        repo: &str,
    ) -> Result<RepositoryUsage, crate::FetchError> {
        let path = format!("repos/{org}/{repo}/actions/workflows?per_page={PER_PAGE}");
        let workflows = self
            .get_all_pages(&path, |page: WorkflowsResponse| page.workflows)
            .await?;

        // Built locally and only returned once every workflow succeeded.
        let mut usage = RepositoryUsage::new(repo);
        for workflow in workflows {
            let timing: WorkflowTimingResponse = self
                .get_json(&format!(
                    "repos/{org}/{repo}/actions/workflows/{}/timing",
                    workflow.id
                ))
                .await?;
            let minutes = timing.to_usage(&workflow.name)?;
            debug!(workflow = %workflow.name, usage = %minutes, "Workflow usage");
            usage = usage.with_workflow(WorkflowUsage::new(workflow.name, minutes))?;
        }
        Ok(usage)
    }

    /// Fetches the organisation's Actions billing.
    #[instrument(skip(self))]
    pub async fn fetch_billing_snapshot(
        &self,
        org: &str,
    ) -> Result<BillingSnapshot, crate::FetchError> {
        let billing: ActionsBillingResponse = self
            .get_json(&format!("orgs/{org}/settings/billing/actions"))
            .await?;
        Ok(billing.to_snapshot()?)
    }

    /// Fetches the days left in the billing cycle.
    #[instrument(skip(self))]
    pub async fn fetch_billing_period(&self, org: &str) -> Result<BillingPeriod, crate::FetchError> {
        let storage: SharedStorageResponse = self
            .get_json(&format!("orgs/{org}/settings/billing/shared-storage"))
            .await?;
        Ok(storage.to_period())
    }
}

impl RepositoryLister for GitHubClient {
    async fn list_repositories(&self, org: &str) -> Result<Vec<String>, CoreError> {
        Ok(self.fetch_repository_names(org).await?)
    }
}

impl BillingPeriodSource for GitHubClient {
    async fn billing_period(&self, org: &str) -> Result<BillingPeriod, CoreError> {
        Ok(self.fetch_billing_period(org).await?)
    }
}

impl WorkflowUsageSource for GitHubClient {
    async fn repository_usage(&self, org: &str, repo: &str) -> Result<RepositoryUsage, CoreError> {
        Ok(self.fetch_repository_usage(org, repo).await?)
    }
}

impl BillingSource for GitHubClient {
    async fn billing_snapshot(&self, org: &str) -> Result<BillingSnapshot, CoreError> {
        Ok(self.fetch_billing_snapshot(org).await?)
    }
}
