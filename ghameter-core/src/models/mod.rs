//! Domain models for GHAMeter.
//!
//! ## Submodules
//!
//! - [`usage`] - Per-OS minute counts (RunnerOs, UsageByOs)
//! - [`repository`] - Workflow and repository usage
//! - [`billing`] - Billing snapshot and billing period

mod billing;
mod repository;
mod usage;

pub use billing::{BillingPeriod, BillingSnapshot};
pub use repository::{RepositoryUsage, WorkflowUsage};
pub use usage::{RunnerOs, UsageByOs};
