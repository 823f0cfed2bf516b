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

//! Sequence matcher tests
//!
//! Tests for resolving keystrokes against a snapshot:
//! - Multi-key sequences and their partial prefixes
//! - Shortest-first tie-breaking
//! - History bookkeeping (capacity, clearing)
//! - Extension bindings reached at match time

use crate::core::{
    builder::SnapshotBuilder,
    matcher::{KeyHistory, MatchOutcome, SequenceMatcher},
    snapshot::BindingSnapshot,
    stack::{EnableFlags, SectionStack},
    types::{Origin, RuleRecord, Section},
};
use pretty_assertions::assert_eq;

fn snapshot_with(origin: Origin, pairs: &[(&str, &str)]) -> BindingSnapshot {
    let rules = pairs.iter().map(|(k, a)| RuleRecord::simple(k, a)).collect();
    let mut stack = SectionStack::new();
    stack.define(Section::new("test", origin, true, rules));
    stack.enable("test", EnableFlags::default());
    SnapshotBuilder::new(&stack).build(1)
}

fn snapshot(pairs: &[(&str, &str)]) -> BindingSnapshot {
    snapshot_with(Origin::UserConfig, pairs)
}

fn executed(outcome: MatchOutcome) -> String {
    match outcome {
        MatchOutcome::Execute(rule) => rule.raw_action().to_string(),
        other => panic!("Expected Execute, got: {:?}", other),
    }
}

fn history(matcher: &SequenceMatcher) -> Vec<&str> {
    matcher.history().iter().collect()
}

#[test]
fn test_history_newest_first_capped() {
    let mut history = KeyHistory::new();
    for key in ["a", "b", "c", "d", "e"] {
        history.push(key);
    }

    assert_eq!(history.len(), 4);
    assert_eq!(history.iter().collect::<Vec<_>>(), vec!["e", "d", "c", "b"]);

    history.clear();
    assert!(history.is_empty());
}

#[test]
fn test_three_key_sequence() {
    let snapshot = snapshot(&[("a-b-c", "run")]);
    let mut matcher = SequenceMatcher::new();

    assert_eq!(matcher.resolve("a", &snapshot), MatchOutcome::Suppress);
    assert_eq!(matcher.resolve("b", &snapshot), MatchOutcome::Suppress);
    assert_eq!(executed(matcher.resolve("c", &snapshot)), "run");
    assert!(matcher.history().is_empty());
}

#[test]
fn test_four_key_sequence() {
    let snapshot = snapshot(&[("w-x-y-z", "deep")]);
    let mut matcher = SequenceMatcher::new();

    for key in ["w", "x", "y"] {
        assert_eq!(matcher.resolve(key, &snapshot), MatchOutcome::Suppress);
    }
    assert_eq!(executed(matcher.resolve("z", &snapshot)), "deep");
}

#[test]
fn test_shortest_match_wins() {
    let snapshot = snapshot(&[("a", "single"), ("a-b", "sequence")]);
    let mut matcher = SequenceMatcher::new();

    assert_eq!(executed(matcher.resolve("a", &snapshot)), "single");
    assert!(matcher.history().is_empty());

    // `b` is evaluated on a fresh history, so `a-b` is unreachable
    assert_eq!(matcher.resolve("b", &snapshot), MatchOutcome::Unrecognized);
    assert_eq!(history(&matcher), vec!["b"]);
}

#[test]
fn test_single_key_beats_longer_sequence_ending_in_it() {
    let snapshot = snapshot(&[("b", "single"), ("a-b", "sequence")]);
    let mut matcher = SequenceMatcher::new();

    assert_eq!(matcher.resolve("a", &snapshot), MatchOutcome::Suppress);
    assert_eq!(executed(matcher.resolve("b", &snapshot)), "single");
}

#[test]
fn test_unrecognized_keeps_history() {
    let snapshot = snapshot(&[("x-y", "run")]);
    let mut matcher = SequenceMatcher::new();

    assert_eq!(matcher.resolve("q", &snapshot), MatchOutcome::Unrecognized);
    assert_eq!(matcher.resolve("x", &snapshot), MatchOutcome::Suppress);
    assert_eq!(history(&matcher), vec!["x", "q"]);

    assert_eq!(executed(matcher.resolve("y", &snapshot)), "run");
}

#[test]
fn test_broken_sequence_can_restart() {
    let snapshot = snapshot(&[("g-g", "top")]);
    let mut matcher = SequenceMatcher::new();

    assert_eq!(matcher.resolve("g", &snapshot), MatchOutcome::Suppress);
    assert_eq!(matcher.resolve("x", &snapshot), MatchOutcome::Unrecognized);
    assert_eq!(matcher.resolve("g", &snapshot), MatchOutcome::Suppress);
    assert_eq!(executed(matcher.resolve("g", &snapshot)), "top");
}

#[test]
fn test_explicit_ignore_suppresses() {
    let snapshot = snapshot(&[("MBTN_MID", "ignore")]);
    let mut matcher = SequenceMatcher::new();

    assert_eq!(matcher.resolve("MBTN_MID", &snapshot), MatchOutcome::Suppress);
    assert_eq!(matcher.history().len(), 1);
}

#[test]
fn test_clear_history() {
    let snapshot = snapshot(&[("g-g", "top")]);
    let mut matcher = SequenceMatcher::new();

    matcher.resolve("g", &snapshot);
    matcher.clear_history();
    assert_eq!(matcher.resolve("g", &snapshot), MatchOutcome::Suppress);
}

#[test]
fn test_extension_binding_is_not_executed() {
    let snapshot = snapshot_with(Origin::Extension, &[("Meta+o", "script-message ext")]);
    let mut matcher = SequenceMatcher::new();

    assert_eq!(matcher.resolve("Meta+o", &snapshot), MatchOutcome::Unrecognized);
    assert_eq!(history(&matcher), vec!["Meta+o"]);
}

#[test]
fn test_extension_prefix_still_suppresses() {
    let snapshot = snapshot_with(Origin::Extension, &[("a-b", "script-message ext")]);
    let mut matcher = SequenceMatcher::new();

    assert_eq!(matcher.resolve("a", &snapshot), MatchOutcome::Suppress);
}

#[test]
fn test_empty_snapshot() {
    let snapshot = BindingSnapshot::empty();
    let mut matcher = SequenceMatcher::new();

    assert_eq!(matcher.resolve("a", &snapshot), MatchOutcome::Unrecognized);
}

#[test]
fn test_matchers_are_independent() {
    let snapshot = snapshot(&[("g-g", "top")]);
    let mut first = SequenceMatcher::new();
    let mut second = SequenceMatcher::new();

    first.resolve("g", &snapshot);
    assert_eq!(second.resolve("x", &snapshot), MatchOutcome::Unrecognized);
    assert_eq!(executed(first.resolve("g", &snapshot)), "top");
}

#[test]
fn test_prefix_of_ignored_sequence_is_swallowed() {
    let snapshot = snapshot(&[("a-b", "ignore"), ("c", "quit")]);
    let mut matcher = SequenceMatcher::new();

    assert_eq!(matcher.resolve("a", &snapshot), MatchOutcome::Suppress);
    assert_eq!(history(&matcher), vec!["a"]);
    assert_eq!(executed(matcher.resolve("c", &snapshot)), "quit");
}
