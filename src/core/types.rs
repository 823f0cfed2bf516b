//! src/core/types.rs
//!
//! Core type definitions for key-binding resolution
//!
//! This module defines the fundamental types used throughout the engine:
//! - `Origin`: Where a section of rules came from (user config, filter preset, ...)
//! - `Modifier`: Keyboard modifier keys in mpv's canonical order
//! - `KeyStroke`: One normalised keystroke (modifiers plus a key name)
//! - `RuleRecord`: One keystroke-to-command rule, immutable once parsed
//! - `Section`: A named, ordered group of rules with a strong/weak flag
//!
//! Rules are shared between sections, snapshots and matchers through `Arc`,
//! so nothing here is ever mutated after construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::core::parser;

/// The command that swallows a keystroke without doing anything.
pub const IGNORE_COMMAND: &str = "ignore";

/// Line prefix marking a rule written in the player's extended syntax.
pub const EXTENDED_SYNTAX_PREFIX: &str = "#@iina";

/// Raw key of the `default-bindings start` marker line.
pub const BUILTIN_DEFAULTS_KEY: &str = "default-bindings";

/// Action of the `default-bindings start` marker line.
pub const BUILTIN_DEFAULTS_ACTION: &str = "start";

/// Longest key sequence (in keystrokes) that can be bound.
pub const MAX_SEQUENCE_LEN: usize = 4;

/// Where a section's rules came from.
///
/// Every comparison site matches on this exhaustively, so adding a variant
/// forces each of them to be revisited.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Origin {
    /// The user's primary input configuration
    UserConfig,
    /// Key equivalents of saved audio/video filter presets
    FilterPreset,
    /// Rules injected by extensions (plugins, scripts)
    Extension,
    /// Built-in defaults
    BuiltIn,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::UserConfig => write!(f, "user config"),
            Origin::FilterPreset => write!(f, "filter preset"),
            Origin::Extension => write!(f, "extension"),
            Origin::BuiltIn => write!(f, "built-in"),
        }
    }
}

/// Keyboard modifier keys
///
/// Variant order is the canonical order used when printing a normalised
/// keystroke (`Shift+Ctrl+Alt+Meta+x`), so `Ord` is derived from it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Modifier {
    /// Shift key
    Shift,
    /// Control key
    Ctrl,
    /// Alt/Option key
    Alt,
    /// Meta/Command key
    Meta,
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Shift => write!(f, "Shift"),
            Modifier::Ctrl => write!(f, "Ctrl"),
            Modifier::Alt => write!(f, "Alt"),
            Modifier::Meta => write!(f, "Meta"),
        }
    }
}

/// A single keystroke: zero or more modifiers plus a key name
///
/// Two keystrokes typed differently but meaning the same thing
/// (`ctrl+shift+x` vs `Shift+Ctrl+x`) compare equal after `new()`.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct KeyStroke {
    /// Sorted, de-duplicated modifiers
    pub modifiers: Vec<Modifier>,

    /// Key name. Single characters keep their case; named keys are uppercase.
    pub key: String,
}

impl KeyStroke {
    /// Create a new KeyStroke with normalized data
    ///
    /// Normalisation includes:
    /// - Sorting and de-duplicating modifiers
    /// - Folding `Shift` into single ASCII letters (`Shift+a` → `A`)
    /// - Converting multi-character key names to uppercase (`enter` → `ENTER`)
    pub fn new(mut modifiers: Vec<Modifier>, key: &str) -> Self {
        modifiers.sort();
        modifiers.dedup();

        let mut chars = key.chars();
        let key = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() && modifiers.contains(&Modifier::Shift) => {
                modifiers.retain(|m| *m != Modifier::Shift);
                c.to_ascii_uppercase().to_string()
            }
            (Some(_), None) => key.to_string(),
            _ => key.to_uppercase(),
        };

        Self { modifiers, key }
    }
}

impl fmt::Display for KeyStroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier)?;
        }
        write!(f, "{}", self.key)
    }
}

/// One keystroke-to-command rule
///
/// Built once (by the parser or by a collaborator) and never mutated. The
/// normalised key and the optional `{section}` target are derived at
/// construction time so every later reader sees the same values.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RuleRecord {
    raw_key: String,
    normalized_key: String,
    action: Vec<String>,
    raw_action: String,
    comment: Option<String>,
    is_extension_syntax: bool,
    explicit_target_section: Option<String>,
}

impl RuleRecord {
    /// Creates a rule from its raw key and raw action text.
    ///
    /// A key that cannot be normalised (too many keystrokes, unknown
    /// modifier) gets an empty normalised key; the builder reports it as
    /// invalid and never enters it into the resolver.
    pub fn new(raw_key: &str, raw_action: &str, is_extension_syntax: bool, comment: Option<String>) -> Self {
        let raw_key = raw_key.trim().to_string();
        let raw_action = raw_action.trim().to_string();
        let normalized_key = parser::normalize_key(&raw_key).unwrap_or_default();
        let action: Vec<String> = raw_action.split_whitespace().map(str::to_string).collect();
        let explicit_target_section = if action.len() > 1 {
            parser::parse_target_section(&action[0])
        } else {
            None
        };

        Self {
            raw_key,
            normalized_key,
            action,
            raw_action,
            comment,
            is_extension_syntax,
            explicit_target_section,
        }
    }

    /// Creates a plain (non-extension) rule without a comment.
    pub fn simple(raw_key: &str, raw_action: &str) -> Self {
        Self::new(raw_key, raw_action, false, None)
    }

    /// Synthetic `ignore` rule swallowing a partial key sequence.
    pub fn ignore_placeholder(key: &str) -> Self {
        Self::new(key, IGNORE_COMMAND, false, Some("(partial sequence)".to_string()))
    }

    /// Returns a copy of this rule with a different action, keeping key,
    /// comment and syntax flag.
    pub fn with_raw_action(&self, raw_action: &str) -> Self {
        Self::new(&self.raw_key, raw_action, self.is_extension_syntax, self.comment.clone())
    }

    /// Returns a copy without the leading `{section}` token, if there is one.
    pub fn without_target_section(&self) -> Self {
        if self.explicit_target_section.is_none() {
            return self.clone();
        }
        self.with_raw_action(&self.action[1..].join(" "))
    }

    pub fn raw_key(&self) -> &str {
        &self.raw_key
    }

    /// Key in canonical form, used as the resolver key. Empty if invalid.
    pub fn normalized_key(&self) -> &str {
        &self.normalized_key
    }

    /// Whitespace-separated action tokens
    pub fn action(&self) -> &[String] {
        &self.action
    }

    pub fn raw_action(&self) -> &str {
        &self.raw_action
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn is_extension_syntax(&self) -> bool {
        self.is_extension_syntax
    }

    /// Section named by a leading `{section}` action token, e.g.
    /// `Meta+k {default} screenshot`.
    pub fn explicit_target_section(&self) -> Option<&str> {
        self.explicit_target_section.as_deref()
    }

    /// True if this rule's whole action is `ignore`.
    pub fn is_ignored(&self) -> bool {
        self.raw_action == IGNORE_COMMAND
    }

    /// True for the `default-bindings start` marker line.
    pub fn is_builtin_defaults_marker(&self) -> bool {
        self.raw_key == BUILTIN_DEFAULTS_KEY
            && self.action.len() == 1
            && self.action[0] == BUILTIN_DEFAULTS_ACTION
    }

    /// Number of keystrokes in the normalised key (0 if invalid).
    pub fn sequence_len(&self) -> usize {
        if self.normalized_key.is_empty() {
            0
        } else {
            parser::split_key_sequence(&self.normalized_key).len()
        }
    }

    /// Action tokens joined by single spaces, prefixed for extended syntax.
    pub fn readable_action(&self) -> String {
        let joined = self.action.join(" ");
        if self.is_extension_syntax {
            format!("{} {}", EXTENDED_SYNTAX_PREFIX, joined)
        } else {
            joined
        }
    }

    /// Serialised form, suitable for a single line of an input conf file.
    pub fn conf_file_format(&self) -> String {
        let prefix = if self.is_extension_syntax {
            format!("{} ", EXTENDED_SYNTAX_PREFIX)
        } else {
            String::new()
        };
        let comment = match self.comment.as_deref() {
            Some(c) if !c.is_empty() => format!("   #{}", c),
            _ => String::new(),
        };
        format!("{}{} {}{}", prefix, self.raw_key, self.raw_action, comment)
    }
}

impl fmt::Display for RuleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.raw_key, self.readable_action())
    }
}

/// A named, ordered group of rules
///
/// Strong (`is_force`) sections outrank everything enabled before them;
/// weak sections only fill keys nobody else has bound.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    /// Unique within a stack
    pub name: String,

    /// Where the rules came from
    pub origin: Origin,

    /// Strong ("force") or weak ("default") priority
    pub is_force: bool,

    /// Rules in file order
    pub rules: Vec<Arc<RuleRecord>>,
}

impl Section {
    pub fn new(name: &str, origin: Origin, is_force: bool, rules: Vec<RuleRecord>) -> Self {
        Self {
            name: name.to_string(),
            origin,
            is_force,
            rules: rules.into_iter().map(Arc::new).collect(),
        }
    }

    /// Builds a section from mpv `define-section` flags (`default` / `force`).
    pub fn from_flags<S: AsRef<str>>(name: &str, origin: Origin, flags: &[S], rules: Vec<RuleRecord>) -> Self {
        let is_force = flags.iter().any(|flag| flag.as_ref() == "force");
        Self::new(name, origin, is_force, rules)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Section(\"{}\", {}, {}, {} rules)",
            self.name,
            self.origin,
            if self.is_force { "force" } else { "weak" },
            self.rules.len()
        )
    }
}
