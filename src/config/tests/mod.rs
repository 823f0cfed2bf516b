//! Config module tests
//!
//! - Input conf loading from disk
//! - Engine settings parsing
