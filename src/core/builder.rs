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

//! Snapshot builder
//!
//! Collapses the enabled sections of a `SectionStack` into one
//! `BindingSnapshot`. A build runs in three passes:
//!
//! 1. **Merge**: walk the enabled sections bottom to top. Strong sections
//!    append their rules in file order (later rule wins). Weak sections go
//!    in reverse file order (earlier rule wins) on top of the weak block at
//!    the bottom of the list, so every weak rule loses to every strong rule
//!    and a later-enabled weak section beats an earlier one. The walk
//!    starts at the topmost exclusive section, if any, so nothing below it
//!    contributes. Each rule is validated on the way in.
//! 2. **Resolve**: scan the merged list in increasing priority. When two
//!    enabled rules share a key, the later one wins and the earlier one is
//!    disabled with a reason.
//! 3. **Fill**: for every enabled key sequence, insert `ignore`
//!    placeholders for each proper prefix nobody has bound, so typing part
//!    of a chord is swallowed instead of reported as unknown.
//!
//! The candidate list is built fresh for every build and only mutated
//! during pass 2; once `build` returns, nothing touches it again.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use crate::core::parser::split_key_sequence;
use crate::core::snapshot::{Binding, BindingSnapshot};
use crate::core::stack::{SectionStack, USER_CONF_SECTION};
use crate::core::types::{Origin, RuleRecord, Section, MAX_SEQUENCE_LEN};
use crate::core::validator::{validate_rule, RuleVerdict};

/// Builds snapshots from a stable view of a section stack.
pub struct SnapshotBuilder<'a> {
    stack: &'a SectionStack,
    log_rebuild: bool,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(stack: &'a SectionStack) -> Self {
        Self {
            stack,
            log_rebuild: false,
        }
    }

    /// Enables per-rule trace logging for this build.
    pub fn log_rebuild(mut self, enabled: bool) -> Self {
        self.log_rebuild = enabled;
        self
    }

    /// Runs all three passes and packages the result under `version`.
    pub fn build(&self, version: u64) -> BindingSnapshot {
        tracing::debug!(version, "Starting rebuild of binding snapshot");

        let (mut candidates, user_section_range) = self.combine_enabled_sections();
        let mut resolver = resolve_overrides(&mut candidates);

        // Last, so a placeholder can never block a real binding
        let added = fill_partial_sequences(&mut resolver);
        if self.log_rebuild {
            tracing::trace!(added, "Added ignore bindings for partial key sequences");
        }

        let snapshot = BindingSnapshot::new(version, candidates, resolver, user_section_range);
        tracing::debug!(
            version,
            bindings = snapshot.resolver_len(),
            "Finished rebuild of binding snapshot"
        );
        if self.log_rebuild {
            snapshot.log_enabled_bindings();
        }

        snapshot
    }

    /// Merge pass. Returns the candidates in increasing priority, plus the
    /// index range occupied by the user conf section.
    fn combine_enabled_sections(&self) -> (Vec<Binding>, Range<usize>) {
        let mut merged: Vec<Binding> = Vec::new();
        let mut user_conf_count = 0;
        let mut weak_count = 0;

        // Nothing below the topmost exclusive entry contributes
        let enabled = self.stack.enabled();
        let start = match enabled.iter().rposition(|entry| entry.is_exclusive) {
            Some(idx) => {
                tracing::debug!(
                    section = %enabled[idx].name,
                    "Section was enabled exclusively; ignoring sections below it"
                );
                idx
            }
            None => 0,
        };

        for entry in &enabled[start..] {
            let Some(section) = self.stack.section(&entry.name) else {
                tracing::error!(section = %entry.name, "Enabled section is not defined; skipping it");
                continue;
            };

            let is_user_conf = match section.origin {
                Origin::UserConfig => section.name == USER_CONF_SECTION,
                Origin::FilterPreset | Origin::Extension | Origin::BuiltIn => false,
            };
            self.add_section_bindings(section, &mut merged, weak_count);

            if is_user_conf {
                user_conf_count = section.rules.len();
            } else if !section.is_force {
                weak_count += section.rules.len();
            }
        }

        (merged, weak_count..weak_count + user_conf_count)
    }

    /// `weak_top` is the index just above the weak rules merged so far.
    fn add_section_bindings(&self, section: &Section, merged: &mut Vec<Binding>, weak_top: usize) {
        if section.rules.is_empty() {
            if self.log_rebuild {
                tracing::trace!(section = %section.name, "Skipping section with no bindings");
            }
            return;
        }

        if section.is_force {
            if self.log_rebuild {
                tracing::trace!(%section, "Adding bindings to tail of list");
            }
            for rule in &section.rules {
                merged.push(self.build_candidate(rule, section));
            }
        } else {
            if self.log_rebuild {
                tracing::trace!(%section, weak_top, "Adding bindings above weak block, in reverse order");
            }
            // Each insert lands below the previous one: reverse file order
            for rule in &section.rules {
                merged.insert(weak_top, self.build_candidate(rule, section));
            }
        }
    }

    fn build_candidate(&self, rule: &Arc<RuleRecord>, section: &Section) -> Binding {
        match validate_rule(rule, &section.name) {
            RuleVerdict::Accept => Binding::new(Arc::clone(rule), &section.name, section.origin),
            RuleVerdict::Rewrite(rewritten) => {
                tracing::debug!(
                    key = rule.raw_key(),
                    section = %section.name,
                    "Removing redundant section specifier from binding"
                );
                Binding::new(Arc::new(rewritten), &section.name, section.origin)
            }
            RuleVerdict::Reject(reason) => {
                tracing::debug!(
                    key = rule.raw_key(),
                    section = %section.name,
                    %reason,
                    "Disabling binding"
                );
                let mut binding = Binding::new(Arc::clone(rule), &section.name, section.origin);
                binding.is_enabled = false;
                binding.override_reason = Some(reason.to_string());
                binding
            }
        }
    }
}

/// Resolver pass. Later candidates override earlier ones with the same key;
/// the losers are disabled in `candidates`.
fn resolve_overrides(candidates: &mut [Binding]) -> HashMap<String, Binding> {
    let mut slots: HashMap<String, usize> = HashMap::new();

    for idx in 0..candidates.len() {
        if !candidates[idx].is_enabled {
            continue;
        }

        // Empty keys are unfinished rows from an editor
        let key = candidates[idx].key().to_string();
        if key.is_empty() {
            continue;
        }

        if let Some(prev) = slots.insert(key.clone(), idx) {
            let reason = override_reason(&candidates[prev], &candidates[idx], &key);
            let loser = &mut candidates[prev];
            loser.is_enabled = false;
            loser.override_reason = Some(reason);
        }
    }

    slots
        .into_iter()
        .map(|(key, idx)| (key, candidates[idx].clone()))
        .collect()
}

fn override_reason(overridden: &Binding, winner: &Binding, key: &str) -> String {
    match overridden.origin {
        Origin::Extension => format!(
            "\"{}\" is overridden by \"{}\". Extensions must use key bindings which have not already been used.",
            key,
            winner.rule.readable_action()
        ),
        Origin::UserConfig | Origin::FilterPreset | Origin::BuiltIn => format!(
            "This binding is overridden by another binding below it which also uses \"{}\"",
            key
        ),
    }
}

/// Fill pass. Returns how many placeholders were added.
fn fill_partial_sequences(resolver: &mut HashMap<String, Binding>) -> usize {
    let mut sequences: Vec<(String, String, Origin)> = resolver
        .iter()
        .filter(|(_, binding)| binding.is_enabled)
        .filter(|(key, _)| (2..=MAX_SEQUENCE_LEN).contains(&split_key_sequence(key).len()))
        .map(|(key, binding)| (key.clone(), binding.origin_section.clone(), binding.origin))
        .collect();

    // Deterministic placeholder ownership when two sequences share a prefix
    sequences.sort_by(|a, b| a.0.cmp(&b.0));

    let mut added = 0;
    for (key, section_name, origin) in &sequences {
        let tokens = split_key_sequence(key);
        for end in 1..tokens.len() {
            let prefix = tokens[..end].join("-");
            if resolver.contains_key(&prefix) {
                continue;
            }
            let placeholder = Arc::new(RuleRecord::ignore_placeholder(&prefix));
            resolver.insert(prefix, Binding::new(placeholder, section_name, *origin));
            added += 1;
        }
    }

    added
}
