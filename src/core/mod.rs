// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! src/core/mod.rs
//!
//! Core resolution logic
//!
//! This module contains the data structures and algorithms of the engine:
//! - Type definitions for rules, sections and keystrokes
//! - Key and input conf parsing
//! - Per-rule validation
//! - The section stack (define / enable / disable)
//! - The snapshot builder and the snapshots it publishes
//! - The per-context sequence matcher
//!
//! Nothing here spawns threads or touches the filesystem, so all of it is
//! unit-testable in isolation. Serialisation and publishing live in
//! `crate::engine`.

pub mod builder;
pub mod matcher;
pub mod parser;
pub mod snapshot;
pub mod stack;
pub mod types;
pub mod validator;

pub use builder::SnapshotBuilder;
pub use matcher::{KeyHistory, MatchOutcome, SequenceMatcher};
pub use snapshot::{Binding, BindingSnapshot};
pub use stack::{EnableFlags, EnabledSection, SectionStack};
pub use types::*;
pub use validator::{validate_rule, RuleVerdict, ValidationError};

#[cfg(test)]
mod tests;
