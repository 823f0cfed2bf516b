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

//! Key sequence matching
//!
//! Each input context (one player window, say) owns a `SequenceMatcher`
//! holding the last 4 keystrokes. On every keystroke it tries the
//! candidate sequences ending at that keystroke, **shortest first**:
//!
//! ```text
//! K,  K-1 K,  K-2 K-1 K,  K-3 K-2 K-1 K
//! ```
//!
//! The first candidate bound to a real command wins and clears the
//! history. `ignore` placeholders mark a partial match but never stop the
//! search. So if both `a` and `a-b` are bound, typing `a` fires `a` and
//! `a-b` can never be reached, exactly like mpv.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::core::snapshot::BindingSnapshot;
use crate::core::types::{Origin, RuleRecord, MAX_SEQUENCE_LEN};

/// Most recent keystrokes, newest first, at most `MAX_SEQUENCE_LEN`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyHistory {
    keys: VecDeque<String>,
}

impl KeyHistory {
    pub fn new() -> Self {
        Self {
            keys: VecDeque::with_capacity(MAX_SEQUENCE_LEN),
        }
    }

    /// Pushes the newest keystroke, evicting the oldest past capacity.
    pub fn push(&mut self, key: &str) {
        self.keys.push_front(key.to_string());
        self.keys.truncate(MAX_SEQUENCE_LEN);
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keystrokes, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

/// What to do with a keystroke
#[derive(Clone, Debug, PartialEq)]
pub enum MatchOutcome {
    /// Run this rule's command
    Execute(Arc<RuleRecord>),
    /// Part of a known sequence: swallow it silently
    Suppress,
    /// Not bound to anything
    Unrecognized,
}

/// Resolves keystrokes against a snapshot, one input context at a time.
#[derive(Clone, Debug, Default)]
pub struct SequenceMatcher {
    history: KeyHistory,
}

impl SequenceMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &KeyHistory {
        &self.history
    }

    /// Forgets any sequence in progress.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Sequences ending at the newest keystroke, shortest first.
    fn candidate_sequences(&self) -> Vec<String> {
        let mut sequences: Vec<String> = Vec::with_capacity(self.history.len());
        for key in self.history.iter() {
            let sequence = match sequences.last() {
                Some(shorter) => format!("{}-{}", key, shorter),
                None => key.to_string(),
            };
            sequences.push(sequence);
        }
        sequences
    }

    /// Resolves one normalised keystroke against `snapshot`.
    pub fn resolve(&mut self, keystroke: &str, snapshot: &BindingSnapshot) -> MatchOutcome {
        self.history.push(keystroke);

        let mut has_partial = false;
        let mut sequence = String::new();

        for candidate in self.candidate_sequences() {
            sequence = candidate;
            tracing::trace!(sequence = %sequence, "Checking key sequence");

            let Some(binding) = snapshot.lookup(&sequence) else {
                continue;
            };

            if binding.is_ignore() {
                tracing::trace!(
                    sequence = %sequence,
                    section = %binding.origin_section,
                    "Partial sequence match"
                );
                has_partial = true;
                continue;
            }

            match binding.origin {
                Origin::Extension => {
                    // Extension key equivalents are handled before this layer
                    tracing::error!(
                        sequence = %sequence,
                        section = %binding.origin_section,
                        version = snapshot.version(),
                        "Key sequence resolved to an extension binding; ignoring it"
                    );
                    snapshot.log_enabled_bindings();
                    return MatchOutcome::Unrecognized;
                }
                Origin::UserConfig | Origin::FilterPreset | Origin::BuiltIn => {
                    tracing::debug!(
                        sequence = %sequence,
                        action = %binding.rule.readable_action(),
                        section = %binding.origin_section,
                        "Found matching binding"
                    );
                    let rule = Arc::clone(&binding.rule);
                    self.history.clear();
                    return MatchOutcome::Execute(rule);
                }
            }
        }

        if has_partial {
            tracing::trace!(sequence = %sequence, "Contains partial sequence, ignoring");
            MatchOutcome::Suppress
        } else {
            tracing::debug!(keystroke, "No active binding for keystroke");
            MatchOutcome::Unrecognized
        }
    }
}
