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

//! Thread-safe binding engine
//!
//! `BindingEngine` is the handle callers hold. Mutations (define, enable,
//! disable, replace) are queued to a single build worker and return
//! immediately. The worker rebuilds the `BindingSnapshot`, swaps it in and
//! notifies subscribers.
//!
//! Readers never wait on the worker: `current_snapshot` and every
//! `InputContext` load the latest published snapshot lock-free.
//!
//! # Example
//!
//! ```no_run
//! use layered_keybind_engine::config::EngineConfig;
//! use layered_keybind_engine::core::{MatchOutcome, RuleRecord};
//! use layered_keybind_engine::engine::BindingEngine;
//!
//! let engine = BindingEngine::start(EngineConfig::default())?;
//! engine.replace_user_conf_rules(vec![RuleRecord::simple("g-g", "seek 0 absolute")], None)?;
//! engine.flush()?;
//!
//! let mut context = engine.new_context();
//! context.resolve("g");
//! if let MatchOutcome::Execute(rule) = context.resolve("g") {
//!     println!("run {}", rule.readable_action());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod context;
mod queue;

pub use context::InputContext;

use std::collections::HashSet;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use arc_swap::ArcSwap;
use crossbeam::channel::{self, Receiver, Sender};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::core::stack::USER_CONF_SECTION;
use crate::core::{BindingSnapshot, EnableFlags, RuleRecord, Section, SectionStack};
use queue::{run_build_loop, BuildCommand, BuildWorker};

/// Opaque data a caller attaches to a request and gets back with the
/// snapshot that includes it.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Notification sent to subscribers after each published build.
#[derive(Clone, Debug)]
pub struct SnapshotChanged {
    pub snapshot: Arc<BindingSnapshot>,

    /// Metadata from every request folded into this build, in request order.
    pub attachments: Vec<Metadata>,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Build queue is not running")]
    QueueClosed,

    #[error("Failed to start build queue: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Handle to a running engine. Dropping it stops the build worker.
pub struct BindingEngine {
    tx: Sender<BuildCommand>,
    current: Arc<ArcSwap<BindingSnapshot>>,
    protected: HashSet<String>,
    worker: Option<JoinHandle<()>>,
}

impl BindingEngine {
    /// Starts an engine over the four shared sections and queues the
    /// initial build.
    pub fn start(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_stack(SectionStack::with_shared_sections(), config)
    }

    /// Starts an engine over a caller-supplied stack.
    pub fn with_stack(stack: SectionStack, config: EngineConfig) -> Result<Self, EngineError> {
        let current = Arc::new(ArcSwap::from_pointee(BindingSnapshot::empty()));
        let protected = stack.protected_names();
        let (tx, rx) = channel::unbounded();

        let worker = BuildWorker::new(stack, config.clone(), Arc::clone(&current));
        let handle = thread::Builder::new()
            .name(config.worker_name.clone())
            .spawn(move || run_build_loop(worker, rx))?;

        tracing::debug!(worker = %config.worker_name, "Started binding engine");

        let engine = Self {
            tx,
            current,
            protected,
            worker: Some(handle),
        };
        engine.request_rebuild(None)?;
        Ok(engine)
    }

    fn send(&self, command: BuildCommand) -> Result<(), EngineError> {
        self.tx.send(command).map_err(|_| EngineError::QueueClosed)
    }

    /// Defines or redefines a section. An empty redefinition of an
    /// existing section withdraws it.
    ///
    /// # Panics
    ///
    /// Panics if `section` is an empty redefinition of a shared section.
    #[allow(clippy::panic)]
    pub fn define_section(&self, section: Section) -> Result<(), EngineError> {
        if section.is_empty() && self.protected.contains(&section.name) {
            panic!("Can never remove a shared input section: \"{}\"", section.name);
        }
        self.send(BuildCommand::Define(section))
    }

    /// Enables a defined section on top of the stack with mpv
    /// `enable-section` flags.
    pub fn enable_section<S: AsRef<str>>(&self, name: &str, flags: &[S]) -> Result<(), EngineError> {
        let flags = EnableFlags::parse(name, flags);
        self.send(BuildCommand::Enable {
            name: name.to_string(),
            flags,
        })
    }

    /// # Panics
    ///
    /// Panics if `name` is a shared section.
    #[allow(clippy::panic)]
    pub fn disable_section(&self, name: &str) -> Result<(), EngineError> {
        if self.protected.contains(name) {
            tracing::error!(section = name, "Attempted to remove a shared input section");
            panic!("Can never remove a shared input section: \"{}\"", name);
        }
        self.send(BuildCommand::Disable(name.to_string()))
    }

    /// Replaces all rules of a shared section in place.
    ///
    /// With `only_if_different`, an identical rule list is not applied and
    /// no build is requested for it (unless `metadata` needs delivering).
    pub fn replace_section_rules(
        &self,
        name: &str,
        rules: Vec<RuleRecord>,
        only_if_different: bool,
        metadata: Option<Metadata>,
    ) -> Result<(), EngineError> {
        self.send(BuildCommand::ReplaceRules {
            name: name.to_string(),
            rules,
            only_if_different,
            metadata: metadata.unwrap_or_default(),
        })
    }

    pub fn replace_user_conf_rules(&self, rules: Vec<RuleRecord>, metadata: Option<Metadata>) -> Result<(), EngineError> {
        self.replace_section_rules(USER_CONF_SECTION, rules, false, metadata)
    }

    /// Queues a rebuild. Requests arriving while a build runs are folded
    /// into the next one.
    pub fn request_rebuild(&self, metadata: Option<Metadata>) -> Result<(), EngineError> {
        self.send(BuildCommand::Rebuild(metadata.unwrap_or_default()))
    }

    /// Registers for `SnapshotChanged` notifications of builds published
    /// after this request is processed.
    pub fn subscribe(&self) -> Result<Receiver<SnapshotChanged>, EngineError> {
        let (tx, rx) = channel::unbounded();
        self.send(BuildCommand::Subscribe(tx))?;
        Ok(rx)
    }

    /// The latest published snapshot.
    pub fn current_snapshot(&self) -> Arc<BindingSnapshot> {
        self.current.load_full()
    }

    /// Blocks until every request queued before this call is applied and
    /// published. Returns the version then current.
    pub fn flush(&self) -> Result<u64, EngineError> {
        let (tx, rx) = channel::bounded(1);
        self.send(BuildCommand::Flush(tx))?;
        rx.recv().map_err(|_| EngineError::QueueClosed)
    }

    /// A new input context resolving against this engine's snapshots.
    pub fn new_context(&self) -> InputContext {
        InputContext::new(Arc::clone(&self.current))
    }
}

impl Drop for BindingEngine {
    fn drop(&mut self) {
        let _ = self.tx.send(BuildCommand::Shutdown);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::error!("Build queue worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests;
