//! Workflow and repository usage.
//!
//! - [`WorkflowUsage`] - One workflow's minutes, immutable
//! - [`RepositoryUsage`] - A repository's total plus its workflows in discovery order

use serde::Serialize;

use super::usage::UsageByOs;
use crate::error::CoreError;

// ============================================================================
// Workflow Usage
// ============================================================================

/// Minutes consumed by a single workflow in a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowUsage {
    name: String,
    usage: UsageByOs,
}

impl WorkflowUsage {
    /// Creates a workflow usage record.
    pub fn new(name: impl Into<String>, usage: UsageByOs) -> Self {
        Self {
            name: name.into(),
            usage,
        }
    }

    /// Workflow name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Minutes consumed by this workflow.
    pub fn usage(&self) -> UsageByOs {
        self.usage
    }
}

// ============================================================================
// Repository Usage
// ============================================================================

/// Usage of one repository.
///
/// `usage` is always the key-wise sum of `actions`. The only way to add a
/// workflow is [`RepositoryUsage::with_workflow`], which keeps both in step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryUsage {
    name: String,
    usage: UsageByOs,
    actions: Vec<WorkflowUsage>,
}

impl RepositoryUsage {
    /// Creates an empty repository accumulator.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            usage: UsageByOs::zero(),
            actions: Vec::new(),
        }
    }

    /// Folds a workflow into this repository and returns the updated value.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if a bucket would overflow.
    pub fn with_workflow(mut self, workflow: WorkflowUsage) -> Result<Self, CoreError> {
        self.usage = self.usage.checked_add(workflow.usage())?;
        self.actions.push(workflow);
        Ok(self)
    }

    /// Builds a repository by folding workflows in the order given.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if a bucket would overflow.
    pub fn from_workflows<I>(name: impl Into<String>, workflows: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = WorkflowUsage>,
    {
        workflows
            .into_iter()
            .try_fold(Self::new(name), Self::with_workflow)
    }

    /// Repository name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Aggregate minutes for the repository.
    pub fn usage(&self) -> UsageByOs {
        self.usage
    }

    /// Workflows in discovery order.
    pub fn actions(&self) -> &[WorkflowUsage] {
        &self.actions
    }

    /// Returns true if any bucket is non-zero.
    pub fn has_usage(&self) -> bool {
        !self.usage.is_zero()
    }

    /// Builds a repository whose stored total is taken as given.
    #[cfg(test)]
    pub(crate) fn with_stored_total(
        name: impl Into<String>,
        usage: UsageByOs,
        actions: Vec<WorkflowUsage>,
    ) -> Self {
        Self {
            name: name.into(),
            usage,
            actions,
        }
    }
}

impl std::fmt::Display for RepositoryUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},  {}", self.name, self.usage)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_two_workflows() {
        let repo = RepositoryUsage::from_workflows(
            "api",
            vec![
                WorkflowUsage::new("build", UsageByOs::new(3, 0, 0)),
                WorkflowUsage::new("release", UsageByOs::new(4, 1, 0)),
            ],
        )
        .unwrap();

        assert_eq!(repo.usage(), UsageByOs::new(7, 1, 0));
        assert_eq!(
            UsageByOs::checked_sum(repo.actions().iter().map(WorkflowUsage::usage)).unwrap(),
            repo.usage()
        );
        assert_eq!(repo.actions().len(), 2);
    }

    #[test]
    fn test_discovery_order_preserved() {
        let repo = RepositoryUsage::new("web")
            .with_workflow(WorkflowUsage::new("zeta", UsageByOs::new(1, 0, 0)))
            .unwrap()
            .with_workflow(WorkflowUsage::new("alpha", UsageByOs::new(2, 0, 0)))
            .unwrap();

        let names: Vec<&str> = repo.actions().iter().map(WorkflowUsage::name).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_empty_repository() {
        let repo = RepositoryUsage::from_workflows("empty", Vec::new()).unwrap();
        assert!(repo.usage().is_zero());
        assert!(repo.actions().is_empty());
        assert!(!repo.has_usage());
    }

    #[test]
    fn test_zero_minute_workflows_have_no_usage() {
        let repo = RepositoryUsage::from_workflows(
            "docs",
            vec![WorkflowUsage::new("lint", UsageByOs::zero())],
        )
        .unwrap();
        assert!(!repo.has_usage());
        assert_eq!(repo.actions().len(), 1);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let result = RepositoryUsage::from_workflows(
            "huge",
            vec![
                WorkflowUsage::new("a", UsageByOs::new(0, 0, u64::MAX)),
                WorkflowUsage::new("b", UsageByOs::new(0, 0, 1)),
            ],
        );
        assert!(matches!(result, Err(CoreError::InvalidData(_))));
    }

    #[test]
    fn test_display() {
        let repo = RepositoryUsage::from_workflows(
            "api",
            vec![WorkflowUsage::new("ci", UsageByOs::new(2, 0, 1))],
        )
        .unwrap();
        assert_eq!(repo.to_string(), "api,  UBUNTU: 2, MACOS: 0, WINDOWS: 1");
    }
}
