//! Integration tests
//!
//! Shared fixtures plus end-to-end scenarios that cross module boundaries.

mod e2e;
pub mod fixtures;
