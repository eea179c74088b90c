//! Shared error types for FleetKit services
//!
//! Pure data types, no HTTP framework required unless the `axum` feature is on:
//! - RFC 9457 Problem Details (`Problem`)
//! - Static business error catalog (`ErrDef` and the constants in [`catalog`])
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod catalog;
pub mod problem;

pub use catalog::ErrDef;
pub use problem::{APPLICATION_PROBLEM_JSON, Problem};
