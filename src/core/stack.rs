//! Input section stack
//!
//! Owns the *defined* sections (by name) and the ordered, duplicate-free
//! list of *enabled* sections. The list is a stack: index 0 is the bottom
//! (lowest priority), the last entry is the top.
//!
//! This mirrors mpv's `define-section` / `enable-section` /
//! `disable-section` commands, including two of its quirks:
//! - Re-enabling a section moves it to the top instead of duplicating it.
//! - Redefining an existing section with no rules withdraws it entirely.
//!
//! A handful of *shared* sections (user config, filter presets,
//! extensions) sit at the bottom of every stack and are protected: their
//! rules can be replaced in place but the sections themselves can never be
//! disabled.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::core::types::{Origin, RuleRecord, Section};

/// Section holding the user's input conf. mpv expects this exact name.
pub const USER_CONF_SECTION: &str = "default";

/// Key equivalents of saved audio filter presets
pub const AUDIO_FILTERS_SECTION: &str = "Audio Filters";

/// Key equivalents of saved video filter presets
pub const VIDEO_FILTERS_SECTION: &str = "Video Filters";

/// Key equivalents registered by extensions
pub const EXTENSIONS_SECTION: &str = "Extensions";

/// One entry of the enabled list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EnabledSection {
    pub name: String,

    /// When set, nothing below this entry contributes to a build.
    pub is_exclusive: bool,
}

/// Flags accepted by `enable`
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EnableFlags {
    pub exclusive: bool,
}

impl EnableFlags {
    pub fn exclusive() -> Self {
        Self { exclusive: true }
    }

    /// Parses mpv `enable-section` flags.
    ///
    /// `exclusive` is honoured. `allow-hide-cursor` and `allow-vo-dragging`
    /// concern mouse handling and are accepted without effect. Anything else
    /// is logged and ignored.
    pub fn parse<S: AsRef<str>>(section_name: &str, flags: &[S]) -> Self {
        let mut parsed = Self::default();
        for flag in flags {
            match flag.as_ref() {
                "exclusive" => parsed.exclusive = true,
                "allow-hide-cursor" | "allow-vo-dragging" => {}
                other => tracing::error!(
                    section = section_name,
                    flag = other,
                    "Unexpected flag when enabling input section"
                ),
            }
        }
        parsed
    }
}

/// Defined and enabled input sections of one engine.
#[derive(Clone, Debug, Default)]
pub struct SectionStack {
    defined: HashMap<String, Section>,
    enabled: Vec<EnabledSection>,
    protected: HashSet<String>,
}

impl SectionStack {
    /// Creates an empty stack with no shared sections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stack whose bottom holds the four shared sections, all
    /// enabled and initially empty, bottom to top:
    /// user conf (strong), audio filters (strong), video filters (strong),
    /// extensions (weak).
    pub fn with_shared_sections() -> Self {
        Self::with_protected_sections(vec![
            Section::new(USER_CONF_SECTION, Origin::UserConfig, true, vec![]),
            Section::new(AUDIO_FILTERS_SECTION, Origin::FilterPreset, true, vec![]),
            Section::new(VIDEO_FILTERS_SECTION, Origin::FilterPreset, true, vec![]),
            Section::new(EXTENSIONS_SECTION, Origin::Extension, false, vec![]),
        ])
    }

    /// Creates a stack with the given sections defined, enabled (first one
    /// at the bottom) and protected from `disable`.
    pub fn with_protected_sections(sections: Vec<Section>) -> Self {
        let mut stack = Self::new();
        for section in sections {
            tracing::trace!(section = %section.name, "Adding initial enabled section");
            stack.protected.insert(section.name.clone());
            stack.enabled.push(EnabledSection {
                name: section.name.clone(),
                is_exclusive: false,
            });
            stack.defined.insert(section.name.clone(), section);
        }
        stack
    }

    /// Defines (or redefines) a section.
    ///
    /// Redefining an existing section with no rules disables and removes it,
    /// matching mpv. The new definition is stored either way but stays
    /// disabled until `enable` is called.
    pub fn define(&mut self, section: Section) {
        if section.is_empty() && self.defined.contains_key(&section.name) {
            tracing::debug!(
                section = %section.name,
                "New definition contains no bindings: disabling and removing it"
            );
            self.disable(&section.name);
        }
        self.defined.insert(section.name.clone(), section);
    }

    /// Puts a defined section on top of the stack.
    ///
    /// Returns false (and logs) if the section was never defined. A section
    /// that is already enabled is moved, not duplicated.
    pub fn enable(&mut self, name: &str, flags: EnableFlags) -> bool {
        if !self.defined.contains_key(name) {
            tracing::error!(section = name, "Cannot enable section: it was never defined");
            return false;
        }

        if flags.exclusive {
            tracing::debug!(section = name, "Enabling exclusive section");
        }

        self.enabled.retain(|entry| entry.name != name);
        self.enabled.push(EnabledSection {
            name: name.to_string(),
            is_exclusive: flags.exclusive,
        });

        tracing::trace!(
            section = name,
            enabled = ?self.enabled_names(),
            "Input section was enabled"
        );
        true
    }

    /// Removes a section from both the enabled list and the definitions.
    ///
    /// Returns false if the section was not defined.
    ///
    /// # Panics
    ///
    /// Panics if `name` is a shared section. Every snapshot relies on the
    /// shared sections existing, so this is a programming error.
    #[allow(clippy::panic)]
    pub fn disable(&mut self, name: &str) -> bool {
        if !self.defined.contains_key(name) {
            return false;
        }
        if self.protected.contains(name) {
            tracing::error!(section = name, "Attempted to remove a shared input section");
            panic!("Can never remove a shared input section: \"{}\"", name);
        }

        self.enabled.retain(|entry| entry.name != name);
        self.defined.remove(name);

        tracing::trace!(section = name, "Input section was disabled");
        true
    }

    /// Replaces the rules of a shared section in place.
    ///
    /// Unlike `define`, this never moves the section in the stack and never
    /// withdraws it when the new list is empty. Returns false (and logs) if
    /// `name` is not a shared section.
    pub fn replace_rules(&mut self, name: &str, rules: Vec<RuleRecord>) -> bool {
        if !self.protected.contains(name) {
            tracing::error!(section = name, "Cannot replace rules: not a shared section");
            return false;
        }
        let Some(section) = self.defined.get_mut(name) else {
            tracing::error!(section = name, "Shared section is missing from the stack");
            return false;
        };

        tracing::debug!(
            section = name,
            count = rules.len(),
            "Replacing all rules in section"
        );
        section.rules = rules.into_iter().map(Arc::new).collect();
        true
    }

    /// Enabled entries, bottom first.
    pub fn enabled(&self) -> &[EnabledSection] {
        &self.enabled
    }

    pub fn enabled_names(&self) -> Vec<&str> {
        self.enabled.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.defined.get(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.contains_key(name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.iter().any(|entry| entry.name == name)
    }

    pub fn is_protected(&self, name: &str) -> bool {
        self.protected.contains(name)
    }

    /// Names of the protected (shared) sections.
    pub fn protected_names(&self) -> HashSet<String> {
        self.protected.clone()
    }
}
