// File:    lib.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: The main library crate for otp-entry-core, reconciling segmented passcode input into a single code.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! # OTP Entry Core Library
//!
//! This library provides the logic behind segmented one-time passcode input:
//! per-cell validation, paste and autofill resolution, SMS code delivery and
//! completion/submission notifications.
//!
//! ```
//! use otp_entry_core::{CodeEngine, CodeOrigin, EngineEvent, Key};
//!
//! let mut engine = CodeEngine::with_shape([1, 1, 1]).unwrap();
//! engine.apply_character(Key::Char('4'), 0);
//! engine.apply_character(Key::Char('8'), 1);
//! let outcome = engine.apply_character(Key::Char('2'), 2);
//! assert!(outcome.events.iter().any(|e| matches!(
//!     e,
//!     EngineEvent::Submitted(result) if result.is_valid && result.origin == CodeOrigin::Manual
//! )));
//! ```

/// SMS Retriever app hash computation.
pub mod app_hash;
/// JSON session configuration.
pub mod config;
/// The code state engine.
pub mod engine;
/// Error types.
pub mod error;
/// Paste and autofill resolution.
pub mod paste;
/// Platform SMS and phone hint receivers.
pub mod receiver;
/// Observable entry sessions.
pub mod session;
/// Code shapes and cell state.
pub mod shape;
/// Code extraction from SMS messages.
pub mod sms;
/// Per-character validation.
pub mod validator;

pub use engine::{
    CodeEngine, CodeOrigin, CompletionEvent, EngineEvent, FocusIntent, KeyOutcome,
    SubmissionResult,
};
pub use error::{AppHashError, ConfigError, ReceiverError, ShapeError};
pub use receiver::{LoopbackReceiver, OtpReceiver, SmsPayload, Subscription, UnsupportedReceiver};
pub use session::{FocusController, OtpSession, SessionEvent};
pub use shape::{CodeShape, CodeState};
pub use validator::{Key, ValidatorRule};
