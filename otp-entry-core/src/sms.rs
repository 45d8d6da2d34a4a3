// File:    sms.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Extraction of the passcode from the text of a received SMS.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Pulling codes out of SMS messages.

use regex::Regex;

/// Finds the code inside a message body.
pub trait CodeExtractor {
    /// Returns the code contained in `message`, if any.
    fn extract(&self, message: &str) -> Option<String>;
}

impl<F> CodeExtractor for F
where
    F: Fn(&str) -> Option<String>,
{
    fn extract(&self, message: &str) -> Option<String> {
        self(message)
    }
}

/// Extracts the first match of a regular expression.
///
/// If the pattern has a capture group, the first group is the code;
/// otherwise the whole match is.
///
/// ```
/// use otp_entry_core::sms::{CodeExtractor, PatternExtractor};
///
/// let extractor = PatternExtractor::new(r"\d{6}").unwrap();
/// assert_eq!(extractor.extract("Your code is 482913").as_deref(), Some("482913"));
/// ```
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    pattern: Regex,
}

impl PatternExtractor {
    /// Compiles `pattern`.
    ///
    /// # Errors
    ///
    /// Returns the regex compile error for an invalid expression.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// The underlying expression.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

impl From<Regex> for PatternExtractor {
    fn from(pattern: Regex) -> Self {
        Self { pattern }
    }
}

impl CodeExtractor for PatternExtractor {
    fn extract(&self, message: &str) -> Option<String> {
        let captures = self.pattern.captures(message)?;
        captures
            .get(1)
            .or_else(|| captures.get(0))
            .map(|m| m.as_str().to_string())
    }
}
