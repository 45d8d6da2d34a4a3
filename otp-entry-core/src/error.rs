// File:    error.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Error types for shape configuration, session configuration, platform receivers and app hashing.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Error types shared across the crate.

use thiserror::Error;

/// A malformed code shape. Always a caller configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// The shape has no cells at all.
    #[error("code input shape must contain at least one cell")]
    Empty,
    /// A cell was declared with a capacity of zero.
    #[error("cell {index} of the code input shape has zero capacity")]
    ZeroCapacity {
        /// Position of the offending cell.
        index: usize,
    },
}

/// Failure to turn a [`crate::config::SessionConfig`] into a working session.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configured shape is malformed.
    #[error(transparent)]
    Shape(#[from] ShapeError),
    /// A configured regular expression does not compile.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as written in the configuration.
        pattern: String,
        /// The underlying compile error.
        #[source]
        source: regex::Error,
    },
    /// The configuration file could not be read or written.
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file is not valid JSON for a session config.
    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rejections surfaced by a platform SMS / phone-hint receiver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiverError {
    /// The platform SMS listener could not be armed.
    #[error("failed to start SMS listener: {0}")]
    ListenerStartFailed(String),
    /// The phone number hint flow was cancelled or failed.
    #[error("phone number hint failed: {0}")]
    HintFailed(String),
    /// The capability does not exist on this platform.
    #[error("{0} is unavailable on this platform")]
    Unsupported(&'static str),
}

impl ReceiverError {
    /// The wire kind string callers branch on.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ListenerStartFailed(_) => "LISTENER_START_FAILED",
            Self::HintFailed(_) => "HINT_FAILED",
            Self::Unsupported(_) => "UNSUPPORTED",
        }
    }
}

/// Failure to compute an SMS-Retriever app hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppHashError {
    /// No package name was given.
    #[error("package name must not be empty")]
    EmptyPackage,
    /// The signing certificate could not be decoded.
    #[error("invalid signing certificate: {0}")]
    InvalidCertificate(String),
}
