//! Core module tests
//!
//! Contains test suites for core functionality:
//! - Type tests (KeyStroke, RuleRecord, Section)
//! - Key and input conf parsing tests
//! - Per-rule validation tests
//! - Section stack tests (define / enable / disable)
//! - Snapshot builder tests (merge order, overrides, partial sequences)
//! - Sequence matcher tests
//! - Property-based invariants of the builder and matcher

#[cfg(test)]
mod builder_tests;
#[cfg(test)]
mod matcher_tests;
