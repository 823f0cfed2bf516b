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

//! Per-rule validation
//!
//! Every rule passes through `validate_rule` while a snapshot is built.
//! Rejections are never fatal: the rule stays in the candidate list,
//! disabled, and the error's `Display` text becomes its override reason.
//!
//! Rejected:
//! - The `default-bindings start` marker (no separate builtin tier here)
//! - Rules whose `{section}` target names a different section
//! - Keys that cannot be normalised (too many keystrokes, bad modifiers)
//!
//! Rewritten:
//! - Rules whose `{section}` target names their own section lose the
//!   redundant annotation

use thiserror::Error;

use crate::core::parser;
use crate::core::types::RuleRecord;

/// Validation errors
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    /// `default-bindings start` marker line
    #[error("Default-level (\"builtin\") bindings are not supported")]
    BuiltinDefaultsUnsupported,

    /// Rule tries to inject itself into another section
    #[error("Adding bindings to other input sections is not supported (target: \"{target}\")")]
    CrossSectionTarget { target: String },

    /// Key could not be normalised
    #[error("Invalid key: {0}")]
    InvalidKey(#[from] parser::ParseError),
}

/// Outcome of validating one rule against the section that holds it.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleVerdict {
    /// Use the rule as-is
    Accept,
    /// Use this rewritten copy instead
    Rewrite(RuleRecord),
    /// Keep the rule for display only, disabled for this reason
    Reject(ValidationError),
}

/// Validates a key sequence: at most 4 keystrokes, known modifiers, no
/// empty key names. The empty key is valid (it is simply never bound).
pub fn validate_key_sequence(raw_key: &str) -> Result<(), ValidationError> {
    parser::normalize_key(raw_key)?;
    Ok(())
}

/// Validates one rule in the context of its section
pub fn validate_rule(rule: &RuleRecord, section_name: &str) -> RuleVerdict {
    if rule.is_builtin_defaults_marker() {
        return RuleVerdict::Reject(ValidationError::BuiltinDefaultsUnsupported);
    }

    if let Err(e) = validate_key_sequence(rule.raw_key()) {
        return RuleVerdict::Reject(e);
    }

    match rule.explicit_target_section() {
        None => RuleVerdict::Accept,
        Some(target) if target == section_name => RuleVerdict::Rewrite(rule.without_target_section()),
        Some(target) => RuleVerdict::Reject(ValidationError::CrossSectionTarget {
            target: target.to_string(),
        }),
    }
}
