//! Engine tests
//!
//! Exercise the build worker thread end to end: queued mutations,
//! published snapshots, subscriptions and per-context matching.
