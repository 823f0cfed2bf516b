// Copyright 2025 bakri (tidynest@proton.me)
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

//! Layered Key-Binding Engine
//!
//! Resolves keystrokes to commands through a stack of mpv-style input
//! sections, the way a media player merges its user config, filter presets,
//! extensions and built-in scripts into one live binding table.
//!
//! # Features
//!
//! - **Input sections:** define / enable / disable with mpv semantics
//!   (strong and weak sections, exclusive enable, empty-redefine withdraw)
//! - **Deterministic merge:** one snapshot per build, every overridden rule
//!   kept with a human-readable reason
//! - **Key sequences:** up to 4 keystrokes (`g-g`), with partial sequences
//!   swallowed instead of reported as unknown
//! - **Serialized rebuilds:** a single worker applies mutations in order and
//!   coalesces bursts into one build
//! - **Lock-free reads:** input contexts resolve against the latest
//!   published snapshot without waiting on a build
//!
//! # Architecture
//!
//! - **`core`:** Pure logic (types, parser, validator, section stack,
//!   snapshot builder, sequence matcher)
//! - **`config`:** Engine settings and input conf loading
//! - **`engine`:** Build queue worker, snapshot publishing, input contexts
//!
//! # Examples
//!
//! ## Building a snapshot directly
//!
//! ```no_run
//! use layered_keybind_engine::core::parser::parse_input_conf;
//! use layered_keybind_engine::core::stack::USER_CONF_SECTION;
//! use layered_keybind_engine::core::{SectionStack, SnapshotBuilder};
//!
//! let rules = parse_input_conf("space cycle pause\ng-g seek 0 absolute\n");
//! let mut stack = SectionStack::with_shared_sections();
//! stack.replace_rules(USER_CONF_SECTION, rules);
//!
//! let snapshot = SnapshotBuilder::new(&stack).build(1);
//! for binding in snapshot.resolved() {
//!     println!("{}", binding);
//! }
//! ```
//!
//! ## Running the engine
//!
//! ```no_run
//! use layered_keybind_engine::config::{load_input_conf, EngineConfig};
//! use layered_keybind_engine::{BindingEngine, MatchOutcome};
//! use std::path::Path;
//!
//! let engine = BindingEngine::start(EngineConfig::default())?;
//! let rules = load_input_conf(Path::new("~/.config/mpv/input.conf"))?;
//! engine.replace_user_conf_rules(rules, None)?;
//! engine.flush()?;
//!
//! let mut context = engine.new_context();
//! match context.resolve("SPACE") {
//!     MatchOutcome::Execute(rule) => println!("run {}", rule.readable_action()),
//!     MatchOutcome::Suppress => {}
//!     MatchOutcome::Unrecognized => println!("unbound"),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod core;
pub mod engine;

// Re-export commonly used types for convenience
pub use core::{BindingSnapshot, MatchOutcome, Origin, RuleRecord, Section};
pub use engine::{BindingEngine, InputContext, Metadata, SnapshotChanged};
