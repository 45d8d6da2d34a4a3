// File:    config.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: JSON session configuration and its translation into engines and sessions.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use crate::engine::CodeEngine;
use crate::error::ConfigError;
use crate::session::OtpSession;
use crate::shape::{CodeShape, delimited_parser};
use crate::sms::PatternExtractor;
use crate::validator::ValidatorRule;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Case conversion applied to manually typed characters.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CharCase {
    /// Store characters as typed.
    #[default]
    None,
    /// Store the uppercase form.
    Uppercase,
    /// Store the lowercase form.
    Lowercase,
}

impl CharCase {
    /// Converts `c`, keeping it unchanged when the conversion is not a single
    /// character (e.g. `ß` uppercases to `SS`).
    #[must_use]
    pub fn apply(self, c: char) -> char {
        match self {
            Self::None => c,
            Self::Uppercase => single_char(c.to_uppercase(), c),
            Self::Lowercase => single_char(c.to_lowercase(), c),
        }
    }
}

fn single_char(mut chars: impl Iterator<Item = char>, fallback: char) -> char {
    match (chars.next(), chars.next()) {
        (Some(converted), None) => converted,
        _ => fallback,
    }
}

const fn default_true() -> bool {
    true
}

/// Settings for one code entry session, as stored in a JSON file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Cell capacities, e.g. `[1, 1, 1, 1, 1, 1]`.
    pub code_input_shape: Vec<usize>,
    /// Initial code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Regular expression each character must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_pattern: Option<String>,
    /// Case conversion for typed characters.
    #[serde(default)]
    pub char_transform: CharCase,
    /// Separator for pasted codes such as `ABC-XYZ`. Fixed-width split if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paste_delimiter: Option<String>,
    /// Submit as soon as the last cell is filled by hand.
    #[serde(default = "default_true")]
    pub automatically_submit: bool,
    /// Regular expression locating the code in an SMS body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_code_pattern: Option<String>,
    /// Arm the SMS listener as soon as the session is attached.
    #[serde(default)]
    pub expect_sms_on_mount: bool,
}

impl SessionConfig {
    /// A configuration with defaults for everything but the shape.
    #[must_use]
    pub fn new(code_input_shape: impl Into<Vec<usize>>) -> Self {
        Self {
            code_input_shape: code_input_shape.into(),
            value: None,
            validate_pattern: None,
            char_transform: CharCase::None,
            paste_delimiter: None,
            automatically_submit: true,
            sms_code_pattern: None,
            expect_sms_on_mount: false,
        }
    }

    /// Validates the shape, compiles the patterns and builds an engine.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Shape`] for a malformed shape and
    /// [`ConfigError::InvalidPattern`] for a pattern that does not compile.
    pub fn build_engine(&self) -> Result<CodeEngine, ConfigError> {
        let shape = CodeShape::new(self.code_input_shape.clone())?;
        let mut builder =
            CodeEngine::builder(shape).automatically_submit(self.automatically_submit);
        if let Some(pattern) = &self.validate_pattern {
            builder = builder.validator(ValidatorRule::pattern(pattern).map_err(|source| {
                ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                }
            })?);
        }
        if self.char_transform != CharCase::None {
            let case = self.char_transform;
            builder = builder.char_transform(move |c| case.apply(c));
        }
        if let Some(delimiter) = &self.paste_delimiter {
            builder = builder.paste_parser(delimited_parser(delimiter.clone()));
        }
        if let Some(value) = &self.value {
            builder = builder.value(value.clone());
        }
        Ok(builder.build())
    }

    /// Builds a full session, including the SMS extractor.
    ///
    /// # Errors
    ///
    /// Same as [`SessionConfig::build_engine`], plus
    /// [`ConfigError::InvalidPattern`] for a bad SMS pattern.
    pub fn build_session(&self) -> Result<OtpSession, ConfigError> {
        let mut builder = OtpSession::builder(self.build_engine()?)
            .expect_sms_on_mount(self.expect_sms_on_mount);
        if let Some(pattern) = &self.sms_code_pattern {
            let extractor =
                PatternExtractor::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
            builder = builder.sms_extractor(extractor);
        }
        Ok(builder.build())
    }
}

/// Loads a session configuration from a JSON file.
///
/// # Errors
///
/// Fails if the file cannot be read or does not parse.
pub fn load_config(path: &Path) -> Result<SessionConfig, ConfigError> {
    let config_str = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&config_str)?)
}

/// Saves a session configuration as pretty-printed JSON.
///
/// # Errors
///
/// Fails if the configuration cannot be serialized or the file written.
pub fn save_config(path: &Path, config: &SessionConfig) -> Result<(), ConfigError> {
    let config_str = serde_json::to_string_pretty(config)?;
    fs::write(path, config_str)?;
    Ok(())
}
