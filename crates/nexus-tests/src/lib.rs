//! # nexus-tests
//!
//! Integration tests for Nexus difficulty retargeting.
//!
//! - Scenario tests for each channel and protocol version
//! - Property-based tests for retarget invariants
//! - Engine tests for history replay and concurrent use

pub mod generators;


#[cfg(test)]
mod property_tests;


pub use generators::*;
