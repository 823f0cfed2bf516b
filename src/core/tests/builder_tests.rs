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

//! Snapshot builder tests
//!
//! Tests for the three build passes:
//! - Merge order of strong, weak and exclusive sections
//! - Per-rule validation during the merge
//! - Override resolution and the reasons it records
//! - Partial-sequence placeholders

use crate::core::{
    builder::SnapshotBuilder,
    snapshot::BindingSnapshot,
    stack::{EnableFlags, SectionStack, EXTENSIONS_SECTION, USER_CONF_SECTION},
    types::{Origin, RuleRecord, Section},
};
use pretty_assertions::assert_eq;

fn rules(pairs: &[(&str, &str)]) -> Vec<RuleRecord> {
    pairs.iter().map(|(k, a)| RuleRecord::simple(k, a)).collect()
}

fn strong(name: &str, pairs: &[(&str, &str)]) -> Section {
    Section::new(name, Origin::BuiltIn, true, rules(pairs))
}

fn weak(name: &str, pairs: &[(&str, &str)]) -> Section {
    Section::new(name, Origin::BuiltIn, false, rules(pairs))
}

fn stack_of(sections: Vec<Section>) -> SectionStack {
    let mut stack = SectionStack::new();
    for section in sections {
        let name = section.name.clone();
        stack.define(section);
        stack.enable(&name, EnableFlags::default());
    }
    stack
}

fn candidate_actions(snapshot: &BindingSnapshot) -> Vec<&str> {
    snapshot.candidates().iter().map(|b| b.rule.raw_action()).collect()
}

fn resolved_action<'a>(snapshot: &'a BindingSnapshot, key: &str) -> Option<&'a str> {
    snapshot.lookup(key).map(|b| b.rule.raw_action())
}

#[test]
fn test_strong_sections_concatenate_in_file_order() {
    let stack = stack_of(vec![
        strong("one", &[("a", "1"), ("b", "2")]),
        strong("two", &[("c", "3"), ("d", "4")]),
    ]);
    let snapshot = SnapshotBuilder::new(&stack).build(1);

    assert_eq!(candidate_actions(&snapshot), vec!["1", "2", "3", "4"]);
}

#[test]
fn test_weak_sections_reverse_internally_later_enabled_ranks_higher() {
    let stack = stack_of(vec![
        weak("one", &[("a", "1"), ("b", "2")]),
        weak("two", &[("c", "3"), ("d", "4")]),
    ]);
    let snapshot = SnapshotBuilder::new(&stack).build(1);

    assert_eq!(candidate_actions(&snapshot), vec!["2", "1", "4", "3"]);
}

#[test]
fn test_weak_section_earlier_rule_wins() {
    let stack = stack_of(vec![weak("one", &[("a", "first"), ("a", "second")])]);
    let snapshot = SnapshotBuilder::new(&stack).build(1);

    assert_eq!(resolved_action(&snapshot, "a"), Some("first"));
}

#[test]
fn test_strong_section_later_rule_wins() {
    let stack = stack_of(vec![strong("one", &[("a", "first"), ("a", "second")])]);
    let snapshot = SnapshotBuilder::new(&stack).build(1);

    assert_eq!(resolved_action(&snapshot, "a"), Some("second"));
}

#[test]
fn test_weak_loses_to_strong_regardless_of_enable_order() {
    let stack = stack_of(vec![strong("base", &[("a", "strong")]), weak("late", &[("a", "weak")])]);
    let snapshot = SnapshotBuilder::new(&stack).build(1);

    assert_eq!(candidate_actions(&snapshot), vec!["weak", "strong"]);
    assert_eq!(resolved_action(&snapshot, "a"), Some("strong"));
}

#[test]
fn test_later_weak_section_beats_earlier_weak_section() {
    let stack = stack_of(vec![weak("one", &[("a", "one")]), weak("two", &[("a", "two")])]);
    let snapshot = SnapshotBuilder::new(&stack).build(1);

    assert_eq!(resolved_action(&snapshot, "a"), Some("two"));
}

#[test]
fn test_reenable_moves_section_to_top() {
    let mut stack = stack_of(vec![strong("one", &[("a", "one")]), strong("two", &[("a", "two")])]);
    assert_eq!(resolved_action(&SnapshotBuilder::new(&stack).build(1), "a"), Some("two"));

    stack.enable("one", EnableFlags::default());
    let snapshot = SnapshotBuilder::new(&stack).build(2);

    assert_eq!(resolved_action(&snapshot, "a"), Some("one"));
    assert_eq!(snapshot.candidates().len(), 2);
}

#[test]
fn test_exclusive_shadows_everything_below() {
    let mut stack = stack_of(vec![
        strong("bottom", &[("a", "bottom"), ("b", "bottom")]),
        strong("modal", &[("a", "modal")]),
    ]);
    stack.enable("modal", EnableFlags::exclusive());
    let snapshot = SnapshotBuilder::new(&stack).build(1);

    assert_eq!(candidate_actions(&snapshot), vec!["modal"]);
    assert!(snapshot.lookup("b").is_none());
}

#[test]
fn test_sections_above_exclusive_still_count() {
    let mut stack = stack_of(vec![
        strong("bottom", &[("b", "bottom")]),
        strong("modal", &[("a", "modal")]),
    ]);
    stack.enable("modal", EnableFlags::exclusive());
    stack.define(strong("top", &[("c", "top")]));
    stack.enable("top", EnableFlags::default());

    let snapshot = SnapshotBuilder::new(&stack).build(1);
    assert_eq!(snapshot.keys(), vec!["a", "c"]);
}

#[test]
fn test_empty_sections_contribute_nothing() {
    let stack = SectionStack::with_shared_sections();
    let snapshot = SnapshotBuilder::new(&stack).build(7);

    assert_eq!(snapshot.version(), 7);
    assert!(snapshot.candidates().is_empty());
    assert_eq!(snapshot.user_section_range(), 0..0);
}

#[test]
fn test_user_section_range() {
    let mut stack = SectionStack::with_shared_sections();
    stack.replace_rules(USER_CONF_SECTION, rules(&[("a", "1"), ("b", "2"), ("c", "3")]));
    stack.replace_rules(EXTENSIONS_SECTION, rules(&[("x", "ext"), ("y", "ext")]));
    stack.define(weak("scripts", &[("z", "script")]));
    stack.enable("scripts", EnableFlags::default());

    let snapshot = SnapshotBuilder::new(&stack).build(1);
    assert_eq!(snapshot.user_section_range(), 3..6);
    assert_eq!(snapshot.user_section_len(), 3);

    let user_actions: Vec<&str> = snapshot.candidates()[snapshot.user_section_range()]
        .iter()
        .map(|b| b.rule.raw_action())
        .collect();
    assert_eq!(user_actions, vec!["1", "2", "3"]);
}

#[test]
fn test_builtin_marker_disabled_but_kept() {
    let stack = stack_of(vec![strong("one", &[("default-bindings", "start"), ("a", "1")])]);
    let snapshot = SnapshotBuilder::new(&stack).build(1);

    assert_eq!(snapshot.candidates().len(), 2);
    let marker = &snapshot.candidates()[0];
    assert!(!marker.is_enabled);
    assert!(marker.override_reason.as_deref().unwrap().contains("not supported"));
    assert!(snapshot.lookup("DEFAULT-BINDINGS").is_none());
}

#[test]
fn test_own_section_target_is_stripped() {
    let stack = stack_of(vec![strong("one", &[("Meta+k", "{one} screenshot")])]);
    let snapshot = SnapshotBuilder::new(&stack).build(1);

    let binding = snapshot.lookup("Meta+k").unwrap();
    assert!(binding.is_enabled);
    assert_eq!(binding.rule.raw_action(), "screenshot");
}

#[test]
fn test_cross_section_target_is_disabled() {
    let stack = stack_of(vec![strong("one", &[("Meta+k", "{other} screenshot")])]);
    let snapshot = SnapshotBuilder::new(&stack).build(1);

    assert!(snapshot.lookup("Meta+k").is_none());
    assert_eq!(snapshot.overridden().len(), 1);
}

#[test]
fn test_override_reason_names_the_key() {
    let stack = stack_of(vec![strong("one", &[("q", "quit")]), strong("two", &[("q", "stop")])]);
    let snapshot = SnapshotBuilder::new(&stack).build(1);

    let overridden = snapshot.overridden();
    assert_eq!(overridden.len(), 1);
    assert_eq!(overridden[0].origin_section, "one");
    assert_eq!(
        overridden[0].override_reason.as_deref(),
        Some("This binding is overridden by another binding below it which also uses \"q\"")
    );
}

#[test]
fn test_extension_loses_with_message() {
    let mut stack = SectionStack::with_shared_sections();
    stack.replace_rules(USER_CONF_SECTION, rules(&[("Meta+o", "open-file")]));
    stack.replace_rules(EXTENSIONS_SECTION, rules(&[("Meta+o", "script-message ext")]));

    let snapshot = SnapshotBuilder::new(&stack).build(1);
    let loser = &snapshot.overridden()[0];
    assert_eq!(loser.origin, Origin::Extension);
    assert_eq!(
        loser.override_reason.as_deref(),
        Some("\"Meta+o\" is overridden by \"open-file\". Extensions must use key bindings which have not already been used.")
    );
}

#[test]
fn test_empty_key_never_resolves() {
    let stack = stack_of(vec![strong("one", &[("", "quit")])]);
    let snapshot = SnapshotBuilder::new(&stack).build(1);

    assert_eq!(snapshot.candidates().len(), 1);
    assert!(snapshot.candidates()[0].is_enabled);
    assert_eq!(snapshot.resolver_len(), 0);
}

#[test]
fn test_resolver_holds_only_enabled_bindings() {
    let stack = stack_of(vec![
        strong("one", &[("a", "1"), ("a", "2"), ("default-bindings", "start")]),
        weak("two", &[("a", "3"), ("b", "4")]),
    ]);
    let snapshot = SnapshotBuilder::new(&stack).build(1);

    for binding in snapshot.resolved() {
        assert!(binding.is_enabled, "{} should be enabled", binding);
    }
}

#[test]
fn test_partial_sequence_prefixes_are_filled() {
    let stack = stack_of(vec![strong("one", &[("a-b-c-d", "deep")])]);
    let snapshot = SnapshotBuilder::new(&stack).build(1);

    assert_eq!(snapshot.keys(), vec!["a", "a-b", "a-b-c", "a-b-c-d"]);
    for prefix in ["a", "a-b", "a-b-c"] {
        let binding = snapshot.lookup(prefix).unwrap();
        assert!(binding.is_ignore());
        assert!(binding.is_enabled);
        assert_eq!(binding.origin_section, "one");
    }
    // Placeholders live only in the resolver
    assert_eq!(snapshot.candidates().len(), 1);
}

#[test]
fn test_placeholder_never_replaces_real_binding() {
    let stack = stack_of(vec![strong("one", &[("a", "real"), ("a-b", "seq")])]);
    let snapshot = SnapshotBuilder::new(&stack).build(1);

    assert_eq!(resolved_action(&snapshot, "a"), Some("real"));
}

#[test]
fn test_ignore_sequence_still_gets_placeholders() {
    let stack = stack_of(vec![strong("one", &[("a-b-c", "ignore")])]);
    let snapshot = SnapshotBuilder::new(&stack).build(1);

    assert_eq!(snapshot.keys(), vec!["a", "a-b", "a-b-c"]);
    assert!(snapshot.lookup("a").is_some_and(|b| b.is_ignore()));
    assert!(snapshot.lookup("a-b").is_some_and(|b| b.is_ignore()));
}

#[test]
fn test_rebuild_logging_does_not_change_result() {
    let stack = stack_of(vec![strong("one", &[("a", "1"), ("g-g", "2")])]);
    let quiet = SnapshotBuilder::new(&stack).build(1);
    let verbose = SnapshotBuilder::new(&stack).log_rebuild(true).build(1);

    assert_eq!(quiet.keys(), verbose.keys());
    assert_eq!(quiet.candidates(), verbose.candidates());
}
