// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `GHAMeter` Core
//!
//! Usage model, aggregation, and threshold evaluation for auditing GitHub
//! Actions minutes across an organisation.
//!
//! This crate is free of I/O. It provides:
//!
//! - Domain models (per-OS minutes, workflows, repositories, billing)
//! - Organisation aggregation with a repository/workflow cross-check
//! - Reconciliation against GitHub's billing figures
//! - Alarm evaluation with a fixed priority order
//! - Collaborator traits for the API client and output channel
//!
//! ## Key Types
//!
//! ### Usage Types
//! - [`UsageByOs`] - Minutes keyed by [`RunnerOs`]
//! - [`WorkflowUsage`] - One workflow's minutes
//! - [`RepositoryUsage`] - A repository and its workflows
//! - [`OrganizationUsage`] - Displayed repositories plus organisation totals
//!
//! ### Billing
//! - [`BillingSnapshot`] - Authoritative billing figures
//! - [`ReconciledUsage`] - Remaining minutes and per-OS drift
//!
//! ### Alarms
//! - [`AlarmLimits`] - Configured thresholds
//! - [`AlarmState`] - Evaluation outcome

pub mod aggregate;
pub mod alarm;
pub mod audit;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod traits;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    BillingPeriod, BillingSnapshot, RepositoryUsage, RunnerOs, UsageByOs, WorkflowUsage,
};

// Aggregation, reconciliation, alarms
pub use aggregate::{InclusionPolicy, OrganizationAggregator, OrganizationUsage};
pub use alarm::{enforce, evaluate, AlarmLimits, AlarmState, FAILURE_REASON_OUTPUT};
pub use audit::{run_audit, AuditReport};
pub use reconcile::{reconcile, OsDrift, ReconciledUsage};

// Re-export traits
pub use traits::{
    BillingPeriodSource, BillingSource, OutputSink, RepositoryLister, UsageSource,
    WorkflowUsageSource,
};
