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

//! src/core/parser.rs
//!
//! Key names and input conf lines
//!
//! This module turns raw text into the structured values the engine works on:
//! - Key sequences (`a-b-c`, up to 4 keystrokes) split and normalised
//! - Keystrokes (`ctrl+shift+x`) with modifiers in canonical order
//! - mpv-style `input.conf` lines (`KEY ACTION #comment`)
//! - The optional `{section}` target token at the start of an action
//!
//! # Architecture
//! Small nom combinators handle the token-level grammar (modifier names,
//! section braces, key/action split). Sequence splitting is done by hand
//! because `-` is both the separator and a valid key name.
//!
//! The parser never resolves anything: it only structures data. Priority
//! and validity decisions happen in the builder and validator.

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_till1, take_until},
    character::complete::{char, space1},
    combinator::{all_consuming, value},
    sequence::delimited,
    IResult, Parser,
};
use thiserror::Error;

use crate::core::types::{KeyStroke, Modifier, RuleRecord, EXTENDED_SYNTAX_PREFIX, MAX_SEQUENCE_LEN};

/// Key parsing errors
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Key sequence '{key}' has {count} keys (max {max})", max = MAX_SEQUENCE_LEN)]
    TooManyKeys { key: String, count: usize },

    #[error("Empty key name in '{key}'")]
    EmptyKeyToken { key: String },

    #[error("Unknown modifier '{modifier}' in '{key}'")]
    UnknownModifier { modifier: String, key: String },
}

/// Normalise a raw key or key sequence into its canonical resolver form.
///
/// An empty (or all-whitespace) key normalises to the empty string, which
/// the builder treats as "not bound".
///
/// # Example
/// ```ignore
/// assert_eq!(normalize_key("ctrl+shift+x-enter")?, "Ctrl+X-ENTER");
/// ```
pub fn normalize_key(raw: &str) -> Result<String, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(String::new());
    }

    let tokens = split_key_sequence(raw);
    if tokens.len() > MAX_SEQUENCE_LEN {
        return Err(ParseError::TooManyKeys {
            key: raw.to_string(),
            count: tokens.len(),
        });
    }

    let strokes = tokens
        .iter()
        .map(|token| parse_key_stroke(token).map(|stroke| stroke.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(strokes.join("-"))
}

/// Split a key sequence on `-`.
///
/// A `-` is a separator only when it ends a non-empty token that does not
/// end in `+`; otherwise it is the minus key itself (`-`, `Ctrl+-`, `a--`).
pub fn split_key_sequence(raw: &str) -> Vec<&str> {
    let bytes = raw.as_bytes();
    let mut tokens = Vec::new();
    let mut start = 0;

    for (i, byte) in bytes.iter().enumerate() {
        if *byte == b'-' && i > start && bytes[i - 1] != b'+' {
            tokens.push(&raw[start..i]);
            start = i + 1;
        }
    }
    tokens.push(&raw[start..]);

    tokens
}

/// Parse one keystroke such as `Ctrl+Shift+x`, `ENTER` or `Alt++`.
pub fn parse_key_stroke(token: &str) -> Result<KeyStroke, ParseError> {
    if token.is_empty() {
        return Err(ParseError::EmptyKeyToken { key: token.to_string() });
    }

    // `+` is both the separator and a key name
    let (modifier_str, key) = if token == "+" {
        ("", "+")
    } else if let Some(mods) = token.strip_suffix("++") {
        (mods, "+")
    } else {
        token.rsplit_once('+').unwrap_or(("", token))
    };

    if key.is_empty() {
        return Err(ParseError::EmptyKeyToken { key: token.to_string() });
    }

    let mut modifiers = Vec::new();
    if !modifier_str.is_empty() {
        for part in modifier_str.split('+') {
            match all_consuming(parse_modifier).parse(part) {
                Ok((_, modifier)) => modifiers.push(modifier),
                Err(_) => {
                    return Err(ParseError::UnknownModifier {
                        modifier: part.to_string(),
                        key: token.to_string(),
                    })
                }
            }
        }
    }

    Ok(KeyStroke::new(modifiers, key))
}

/// Parse a modifier name (case-insensitive, with common aliases).
///
/// - "shift" → Shift
/// - "ctrl" / "control" → Ctrl
/// - "alt" / "option" → Alt
/// - "meta" / "cmd" / "command" → Meta
pub fn parse_modifier(input: &str) -> IResult<&str, Modifier> {
    alt((
        value(Modifier::Shift, tag_no_case("shift")),
        value(Modifier::Ctrl, alt((tag_no_case("control"), tag_no_case("ctrl")))),
        value(Modifier::Alt, alt((tag_no_case("option"), tag_no_case("alt")))),
        value(
            Modifier::Meta,
            alt((tag_no_case("command"), tag_no_case("cmd"), tag_no_case("meta"))),
        ),
    ))
    .parse(input)
}

fn braced_section(input: &str) -> IResult<&str, &str> {
    delimited(char('{'), take_until("}"), char('}')).parse(input)
}

/// Extract the section name from a `{section}` action token.
pub fn parse_target_section(token: &str) -> Option<String> {
    braced_section(token)
        .ok()
        .map(|(_, inner)| inner.trim().to_string())
}

/// Split `KEY ACTION...` on the first run of spaces/tabs.
fn key_and_action(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, key) = take_till1(|c: char| c == ' ' || c == '\t')(input)?;
    let (action, _) = space1(input)?;
    Ok(("", (key, action)))
}

/// Parse a single input conf line
///
/// Format: `[#@iina ]KEY ACTION [#comment]`
///
/// Returns `None` for blank lines, whole-line comments, and lines with no
/// action.
pub fn parse_raw_line(line: &str) -> Option<RuleRecord> {
    let mut content = line.trim();
    if content.is_empty() {
        return None;
    }

    let mut is_extension_syntax = false;
    if content.starts_with('#') {
        match content.strip_prefix(EXTENDED_SYNTAX_PREFIX) {
            Some(remainder) => {
                is_extension_syntax = true;
                content = remainder.trim();
            }
            None => return None,
        }
    }

    let mut comment = None;
    if let Some(sharp) = content.find('#') {
        comment = Some(content[sharp + 1..].trim().to_string());
        content = content[..sharp].trim_end();
    }

    let (_, (key, action)) = key_and_action(content).ok()?;
    let action = action.trim();
    if action.is_empty() {
        return None;
    }

    Some(RuleRecord::new(key, action, is_extension_syntax, comment))
}

/// Parse a complete input conf file into rules, in file order.
///
/// Lines that look like bindings but cannot be parsed are skipped with a
/// warning; one bad line never prevents the rest from loading.
pub fn parse_input_conf(content: &str) -> Vec<RuleRecord> {
    let mut rules = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let line_num = line_num + 1; // Human-readable numbers start at 1

        let trimmed = line.trim();
        if trimmed.is_empty() || (trimmed.starts_with('#') && !trimmed.starts_with(EXTENDED_SYNTAX_PREFIX)) {
            continue;
        }

        match parse_raw_line(trimmed) {
            Some(rule) => rules.push(rule),
            None => tracing::warn!(line = line_num, content = trimmed, "Skipping malformed input conf line"),
        }
    }

    rules
}
