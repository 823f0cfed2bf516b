//! Published binding snapshots
//!
//! A `BindingSnapshot` is the immutable result of one build:
//! - `candidates`: every rule from every contributing section, lowest
//!   priority first, including disabled and overridden ones (for display)
//! - `resolver`: normalised key → the one enabled binding for that key,
//!   plus synthetic `ignore` placeholders for partial key sequences
//! - `version`: strictly increasing across builds
//!
//! Lookup is a single `HashMap` probe, O(1) average case.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::core::types::{Origin, RuleRecord};

/// A rule as resolved by one build
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Binding {
    /// The rule, possibly rewritten during validation
    pub rule: Arc<RuleRecord>,

    /// Name of the section the rule came from
    pub origin_section: String,

    /// Origin of that section
    pub origin: Origin,

    /// False if the rule was rejected or overridden
    pub is_enabled: bool,

    /// Human-readable reason when disabled
    pub override_reason: Option<String>,
}

impl Binding {
    pub(crate) fn new(rule: Arc<RuleRecord>, origin_section: &str, origin: Origin) -> Self {
        Self {
            rule,
            origin_section: origin_section.to_string(),
            origin,
            is_enabled: true,
            override_reason: None,
        }
    }

    /// Normalised key of the underlying rule.
    pub fn key(&self) -> &str {
        self.rule.normalized_key()
    }

    /// True for `ignore` bindings, including partial-sequence placeholders.
    pub fn is_ignore(&self) -> bool {
        self.rule.is_ignored()
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> {}", self.origin_section, self.rule)?;
        if let Some(reason) = &self.override_reason {
            write!(f, " (disabled: {})", reason)?;
        }
        Ok(())
    }
}

/// The merged, read-only key-binding table
#[derive(Clone, Debug, Serialize)]
pub struct BindingSnapshot {
    version: u64,
    candidates: Vec<Binding>,
    resolver: HashMap<String, Binding>,
    user_section_range: Range<usize>,
}

impl BindingSnapshot {
    /// Version 0: nothing bound. Published before the first build.
    pub fn empty() -> Self {
        Self {
            version: 0,
            candidates: Vec::new(),
            resolver: HashMap::new(),
            user_section_range: 0..0,
        }
    }

    pub(crate) fn new(
        version: u64,
        candidates: Vec<Binding>,
        resolver: HashMap<String, Binding>,
        user_section_range: Range<usize>,
    ) -> Self {
        Self {
            version,
            candidates,
            resolver,
            user_section_range,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// The enabled binding (or placeholder) for a normalised key.
    pub fn lookup(&self, key: &str) -> Option<&Binding> {
        self.resolver.get(key)
    }

    /// All candidates, lowest priority first.
    pub fn candidates(&self) -> &[Binding] {
        &self.candidates
    }

    /// Number of keys in the resolver, placeholders included.
    pub fn resolver_len(&self) -> usize {
        self.resolver.len()
    }

    /// Resolver keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.resolver.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Resolver entries, sorted by key.
    pub fn resolved(&self) -> Vec<&Binding> {
        self.keys()
            .into_iter()
            .filter_map(|key| self.resolver.get(key))
            .collect()
    }

    /// Candidates that are still enabled, lowest priority first.
    pub fn enabled_bindings(&self) -> impl Iterator<Item = &Binding> {
        self.candidates.iter().filter(|binding| binding.is_enabled)
    }

    /// Candidates that were rejected or overridden, with their reasons.
    pub fn overridden(&self) -> Vec<&Binding> {
        self.candidates
            .iter()
            .filter(|binding| !binding.is_enabled)
            .collect()
    }

    /// Index range of the user conf section within `candidates`.
    ///
    /// All weak bindings sit below it and all other strong bindings above
    /// it; the range is empty when the user section has no rules.
    pub fn user_section_range(&self) -> Range<usize> {
        self.user_section_range.clone()
    }

    pub fn user_section_len(&self) -> usize {
        self.user_section_range.len()
    }

    /// Dumps the enabled bindings at trace level.
    pub fn log_enabled_bindings(&self) {
        let enabled: Vec<String> = self.enabled_bindings().map(|b| format!("\t{}", b)).collect();
        tracing::trace!(
            version = self.version,
            count = enabled.len(),
            "Currently enabled bindings:\n{}",
            enabled.join("\n")
        );
    }
}

impl Default for BindingSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
