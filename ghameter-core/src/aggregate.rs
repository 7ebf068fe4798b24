//! Organisation-wide aggregation.
//!
//! [`OrganizationAggregator`] folds repositories one at a time. It keeps
//! two independent totals (one from repository sums, one from workflow
//! detail) and a separate list of repositories to display, so the
//! inclusion policy can never change the arithmetic.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::models::{RepositoryUsage, UsageByOs, WorkflowUsage};

// ============================================================================
// Inclusion Policy
// ============================================================================

/// Which repositories are surfaced in reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionPolicy {
    /// Hide repositories whose usage is zero on every runner class.
    pub skip_repos_without_usage: bool,
}

impl InclusionPolicy {
    /// Returns true if the repository belongs in the displayed set.
    pub fn displays(&self, repo: &RepositoryUsage) -> bool {
        !self.skip_repos_without_usage || repo.has_usage()
    }
}

// ============================================================================
// Organization Usage
// ============================================================================

/// Result of aggregating every repository in an organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationUsage {
    /// Repositories to display, in processing order.
    pub repositories: Vec<RepositoryUsage>,
    /// Organisation totals across all processed repositories.
    pub totals: UsageByOs,
    /// Number of repositories that contributed to `totals`.
    pub repositories_processed: usize,
}

// ============================================================================
// Organization Aggregator
// ============================================================================

/// Accumulates repositories into organisation totals.
#[derive(Debug, Clone, Default)]
pub struct OrganizationAggregator {
    policy: InclusionPolicy,
    displayed: Vec<RepositoryUsage>,
    repository_total: UsageByOs,
    workflow_total: UsageByOs,
    processed: usize,
}

impl OrganizationAggregator {
    /// Creates an empty aggregator.
    pub fn new(policy: InclusionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Folds one finished repository into the organisation.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if a total would overflow.
    pub fn fold(mut self, repo: RepositoryUsage) -> Result<Self, CoreError> {
        self.repository_total = self.repository_total.checked_add(repo.usage())?;
        let workflows = UsageByOs::checked_sum(repo.actions().iter().map(WorkflowUsage::usage))?;
        self.workflow_total = self.workflow_total.checked_add(workflows)?;
        self.processed += 1;

        if self.policy.displays(&repo) {
            self.displayed.push(repo);
        } else {
            debug!(repo = %repo.name(), "Skipping repository without usage");
        }
        Ok(self)
    }

    /// Cross-checks both totals and returns the aggregate.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::AggregationMismatch` if the repository-derived and
    /// workflow-derived totals differ.
    pub fn finish(self) -> Result<OrganizationUsage, CoreError> {
        if self.repository_total != self.workflow_total {
            return Err(CoreError::AggregationMismatch {
                repository_total: self.repository_total,
                workflow_total: self.workflow_total,
            });
        }
        Ok(OrganizationUsage {
            repositories: self.displayed,
            totals: self.repository_total,
            repositories_processed: self.processed,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str, workflows: &[(&str, UsageByOs)]) -> RepositoryUsage {
        RepositoryUsage::from_workflows(
            name,
            workflows
                .iter()
                .map(|(n, u)| WorkflowUsage::new(*n, *u)),
        )
        .unwrap()
    }

    fn aggregate(policy: InclusionPolicy, repos: Vec<RepositoryUsage>) -> OrganizationUsage {
        repos
            .into_iter()
            .try_fold(OrganizationAggregator::new(policy), OrganizationAggregator::fold)
            .unwrap()
            .finish()
            .unwrap()
    }

    #[test]
    fn test_skip_empty_repositories() {
        let repos = vec![
            repo("A", &[("build", UsageByOs::new(10, 0, 0))]),
            repo("B", &[]),
        ];
        let org = aggregate(
            InclusionPolicy {
                skip_repos_without_usage: true,
            },
            repos,
        );

        let names: Vec<&str> = org.repositories.iter().map(RepositoryUsage::name).collect();
        assert_eq!(names, vec!["A"]);
        assert_eq!(org.totals, UsageByOs::new(10, 0, 0));
        assert_eq!(org.repositories_processed, 2);
    }

    #[test]
    fn test_policy_does_not_change_totals() {
        let build = || {
            vec![
                repo("api", &[("ci", UsageByOs::new(5, 2, 0))]),
                repo("docs", &[("lint", UsageByOs::zero())]),
                repo("empty", &[]),
                repo("win", &[("pack", UsageByOs::new(0, 0, 8))]),
            ]
        };
        let shown = aggregate(InclusionPolicy::default(), build());
        let hidden = aggregate(
            InclusionPolicy {
                skip_repos_without_usage: true,
            },
            build(),
        );

        assert_eq!(shown.totals, hidden.totals);
        assert_eq!(shown.repositories.len(), 4);
        assert_eq!(hidden.repositories.len(), 2);
        assert_eq!(shown.repositories_processed, hidden.repositories_processed);
    }

    #[test]
    fn test_conservation() {
        let repos = vec![
            repo("a", &[("x", UsageByOs::new(1, 2, 3)), ("y", UsageByOs::new(4, 0, 0))]),
            repo("b", &[("z", UsageByOs::new(0, 7, 1))]),
        ];
        let expected =
            UsageByOs::checked_sum(repos.iter().map(RepositoryUsage::usage)).unwrap();
        let org = aggregate(InclusionPolicy::default(), repos);
        assert_eq!(org.totals, expected);
        assert_eq!(org.totals, UsageByOs::new(5, 9, 4));
    }

    #[test]
    fn test_finish_detects_divergence() {
        let good = repo("ok", &[("ci", UsageByOs::new(3, 0, 0))]);
        let bad = RepositoryUsage::with_stored_total(
            "bad",
            UsageByOs::new(9, 0, 0),
            vec![WorkflowUsage::new("ci", UsageByOs::new(1, 0, 0))],
        );

        let err = OrganizationAggregator::new(InclusionPolicy::default())
            .fold(good)
            .unwrap()
            .fold(bad)
            .unwrap()
            .finish()
            .unwrap_err();
        match err {
            CoreError::AggregationMismatch {
                repository_total,
                workflow_total,
            } => {
                assert_eq!(repository_total, UsageByOs::new(12, 0, 0));
                assert_eq!(workflow_total, UsageByOs::new(4, 0, 0));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_workflow_overflow_is_an_error() {
        let huge = RepositoryUsage::with_stored_total(
            "huge",
            UsageByOs::zero(),
            vec![
                WorkflowUsage::new("a", UsageByOs::new(u64::MAX, 0, 0)),
                WorkflowUsage::new("b", UsageByOs::new(1, 0, 0)),
            ],
        );
        let err = OrganizationAggregator::new(InclusionPolicy::default())
            .fold(huge)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidData(_)));
    }

    #[test]
    fn test_empty_organization() {
        let org = aggregate(InclusionPolicy::default(), Vec::new());
        assert!(org.repositories.is_empty());
        assert!(org.totals.is_zero());
        assert_eq!(org.repositories_processed, 0);
    }
}
