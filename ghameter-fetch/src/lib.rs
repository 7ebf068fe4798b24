// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # GHAMeter Fetch
//!
//! GitHub REST client that feeds the `ghameter-core` audit.
//!
//! - [`client::GitHubClient`] - Authenticated client with retry and `Link` pagination
//! - [`api`] - Response payloads and their conversion into core types
//! - [`retry::RetryStrategy`] - Backoff policy for transient failures
//!
//! `GitHubClient` implements the core collaborator traits, so it can be
//! handed straight to [`ghameter_core::run_audit`].
//!
//! ## Example
//!
//! ```ignore
//! use ghameter_core::{run_audit, InclusionPolicy};
//! use ghameter_fetch::GitHubClient;
//!
//! let client = GitHubClient::new(&token)?;
//! let report = run_audit(&client, "acme", InclusionPolicy::default()).await?;
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod retry;
mod source;

pub use client::{GitHubClient, DEFAULT_API_URL};
pub use error::FetchError;
pub use retry::RetryStrategy;
