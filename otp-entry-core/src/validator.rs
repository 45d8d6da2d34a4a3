// File:    validator.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Per-character acceptance rules for code input cells.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Character validation for code cells.
//!
//! A [`ValidatorRule`] is either a regular expression that must match the whole
//! single character, or an arbitrary predicate. Backspace is never subject to
//! the rule.

use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Key name that platforms report for the backspace key.
pub const BACKSPACE: &str = "Backspace";

/// A single key event delivered to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// The backspace / delete key.
    Backspace,
}

impl Key {
    /// Parses a platform key name: [`BACKSPACE`] or exactly one character.
    ///
    /// Returns `None` for multi-character names such as `"Enter"` or `"Tab"`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == BACKSPACE {
            return Some(Self::Backspace);
        }
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(Self::from(c)),
            _ => None,
        }
    }
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        match c {
            '\u{8}' | '\u{7f}' => Self::Backspace,
            c => Self::Char(c),
        }
    }
}

/// A rule deciding whether a character may be stored in a cell.
#[derive(Clone)]
pub struct ValidatorRule(Rule);

#[derive(Clone)]
enum Rule {
    /// Compiled as `^(?:pattern)$`; keeps the source for display.
    Pattern { source: String, anchored: Regex },
    Predicate(Arc<dyn Fn(char) -> bool + Send + Sync>),
}

impl ValidatorRule {
    /// Compiles `pattern` into a rule that must match the whole character.
    ///
    /// Every alternative is tried against the full character, so `x*|[0-9]`
    /// accepts `'5'`.
    ///
    /// # Errors
    ///
    /// Returns the regex compile error if `pattern` is not a valid expression.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        let anchored = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self(Rule::Pattern {
            source: pattern.to_string(),
            anchored,
        }))
    }

    /// Wraps a predicate function whose answer is used verbatim.
    #[must_use]
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(char) -> bool + Send + Sync + 'static,
    {
        Self(Rule::Predicate(Arc::new(f)))
    }

    /// The pattern as written, for pattern rules.
    #[must_use]
    pub fn as_pattern(&self) -> Option<&str> {
        match &self.0 {
            Rule::Pattern { source, .. } => Some(source),
            Rule::Predicate(_) => None,
        }
    }

    /// Checks a single non-backspace character against the rule.
    #[must_use]
    pub fn allows(&self, c: char) -> bool {
        match &self.0 {
            Rule::Pattern { anchored, .. } => {
                let mut buf = [0u8; 4];
                anchored.is_match(c.encode_utf8(&mut buf))
            }
            Rule::Predicate(f) => f(c),
        }
    }
}

impl fmt::Debug for ValidatorRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Rule::Pattern { source, .. } => f.debug_tuple("Pattern").field(source).finish(),
            Rule::Predicate(_) => f.write_str("Predicate(<fn>)"),
        }
    }
}

/// Decides whether `key` may be applied to a cell under `rule`.
///
/// No rule accepts everything, and backspace is accepted under every rule.
#[must_use]
pub fn accept(key: Key, rule: Option<&ValidatorRule>) -> bool {
    match key {
        Key::Backspace => true,
        Key::Char(c) => rule.is_none_or(|r| r.allows(c)),
    }
}

/// Returns true when every character of `text` passes `rule`.
///
/// Characters inside bulk text are data, so control characters are checked
/// against the rule like any other character.
#[must_use]
pub fn accept_all(text: &str, rule: Option<&ValidatorRule>) -> bool {
    rule.is_none_or(|r| text.chars().all(|c| r.allows(c)))
}
