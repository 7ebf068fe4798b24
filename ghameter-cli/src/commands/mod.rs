//! CLI command implementations.

pub mod audit;
pub mod config;
