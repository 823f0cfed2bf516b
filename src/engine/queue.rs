//! Serialized build queue.
//!
//! One worker thread owns the `SectionStack`. Every mutation and every
//! build runs on it, so a build always sees one consistent stack.
//!
//! Commands that pile up while a build is running are handled as a batch:
//! all mutations are applied in order, then a single snapshot is built and
//! published. Metadata attached to any request in the batch travels with
//! that snapshot's notification, so coalescing never drops an attachment.

use std::sync::Arc;

use arc_swap::ArcSwap;
use crossbeam::channel::{Receiver, Sender};

use crate::config::EngineConfig;
use crate::core::{BindingSnapshot, EnableFlags, RuleRecord, Section, SectionStack, SnapshotBuilder};
use crate::engine::{Metadata, SnapshotChanged};

pub(crate) enum BuildCommand {
    Define(Section),
    Enable {
        name: String,
        flags: EnableFlags,
    },
    Disable(String),
    ReplaceRules {
        name: String,
        rules: Vec<RuleRecord>,
        only_if_different: bool,
        metadata: Metadata,
    },
    Rebuild(Metadata),
    Subscribe(Sender<SnapshotChanged>),
    /// Publish anything pending, then reply with the current version.
    Flush(Sender<u64>),
    Shutdown,
}

pub(crate) struct BuildWorker {
    stack: SectionStack,
    config: EngineConfig,
    current: Arc<ArcSwap<BindingSnapshot>>,
    subscribers: Vec<Sender<SnapshotChanged>>,
    last_version: u64,
    rebuild_requested: bool,
    attachments: Vec<Metadata>,
}

impl BuildWorker {
    pub(crate) fn new(stack: SectionStack, config: EngineConfig, current: Arc<ArcSwap<BindingSnapshot>>) -> Self {
        let last_version = current.load().version();
        Self {
            stack,
            config,
            current,
            subscribers: Vec::new(),
            last_version,
            rebuild_requested: false,
            attachments: Vec::new(),
        }
    }

    pub(crate) fn last_version(&self) -> u64 {
        self.last_version
    }

    /// Applies a batch of commands and publishes at most one snapshot for
    /// it (plus one per `Flush`). Returns false once `Shutdown` is seen.
    pub(crate) fn process_batch(&mut self, batch: Vec<BuildCommand>) -> bool {
        for command in batch {
            match command {
                BuildCommand::Define(section) => {
                    self.stack.define(section);
                    self.rebuild_requested = true;
                }
                BuildCommand::Enable { name, flags } => {
                    if self.stack.enable(&name, flags) {
                        self.rebuild_requested = true;
                    }
                }
                BuildCommand::Disable(name) => {
                    if self.stack.disable(&name) {
                        self.rebuild_requested = true;
                    }
                }
                BuildCommand::ReplaceRules {
                    name,
                    rules,
                    only_if_different,
                    metadata,
                } => {
                    if !only_if_different || self.rules_differ(&name, &rules) {
                        self.stack.replace_rules(&name, rules);
                        self.rebuild_requested = true;
                    }
                    self.attach(metadata);
                }
                BuildCommand::Rebuild(metadata) => {
                    self.rebuild_requested = true;
                    self.attach(metadata);
                }
                BuildCommand::Subscribe(tx) => self.subscribers.push(tx),
                BuildCommand::Flush(reply) => {
                    self.publish_pending();
                    let _ = reply.send(self.last_version);
                }
                BuildCommand::Shutdown => {
                    self.publish_pending();
                    return false;
                }
            }
        }

        self.publish_pending();
        true
    }

    fn rules_differ(&self, name: &str, rules: &[RuleRecord]) -> bool {
        let Some(section) = self.stack.section(name) else {
            return true;
        };
        section.rules.len() != rules.len()
            || section.rules.iter().zip(rules).any(|(old, new)| old.as_ref() != new)
    }

    fn attach(&mut self, metadata: Metadata) {
        if !metadata.is_empty() {
            self.attachments.push(metadata);
            self.rebuild_requested = true;
        }
    }

    fn publish_pending(&mut self) {
        if !self.rebuild_requested {
            return;
        }
        self.rebuild_requested = false;

        let version = self.last_version + 1;
        let snapshot = SnapshotBuilder::new(&self.stack)
            .log_rebuild(self.config.log_bindings_rebuild)
            .build(version);
        let snapshot = Arc::new(snapshot);

        self.last_version = version;
        self.current.store(Arc::clone(&snapshot));

        let change = SnapshotChanged {
            snapshot,
            attachments: std::mem::take(&mut self.attachments),
        };
        tracing::debug!(
            version,
            attachments = change.attachments.len(),
            subscribers = self.subscribers.len(),
            "Published binding snapshot"
        );

        // Drop subscribers whose receiver is gone
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }
}

pub(crate) fn run_build_loop(mut worker: BuildWorker, rx: Receiver<BuildCommand>) {
    while let Ok(first) = rx.recv() {
        let mut batch = vec![first];
        batch.extend(rx.try_iter());
        if batch.len() > 1 {
            tracing::trace!(commands = batch.len(), "Coalescing queued build requests");
        }
        if !worker.process_batch(batch) {
            break;
        }
    }
    tracing::debug!(version = worker.last_version(), "Build queue stopped");
}
