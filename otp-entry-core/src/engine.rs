// File:    engine.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Code state engine reconciling keystrokes, pastes and SMS codes into per-cell values.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! The code state engine.
//!
//! [`CodeEngine`] owns the per-cell values of one entry session. Every
//! mutating operation returns the events it produced instead of calling out,
//! so the state is always committed before anyone observes it.

use crate::error::ShapeError;
use crate::shape::{CodeShape, CodeState, PasteParser};
use crate::validator::{Key, ValidatorRule, accept};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Transform applied to a manually typed character before it is stored.
pub type CharTransform = Arc<dyn Fn(char) -> char + Send + Sync>;

/// How a completed or submitted code was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeOrigin {
    /// Typed cell by cell.
    Manual,
    /// Pasted, autofilled or delivered by SMS.
    PastedOrSms,
    /// Submitted by an explicit user action.
    ExplicitSubmit,
}

/// The full code was entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionEvent {
    /// The joined code.
    pub code: String,
    /// Where it came from.
    pub origin: CodeOrigin,
}

/// Outcome of a submission. Invalid codes are reported, not suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionResult {
    /// Whether the code was strictly complete at submission time.
    pub is_valid: bool,
    /// The joined code.
    pub code: String,
    /// Where it came from.
    pub origin: CodeOrigin,
}

/// Notifications produced by engine operations, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// The cell values changed.
    Changed {
        /// The joined code after the change.
        code: String,
        /// Cell values after the change.
        cells: Vec<String>,
    },
    /// A complete code was entered.
    CodeEntered(CompletionEvent),
    /// The code was submitted.
    Submitted(SubmissionResult),
}

/// Where input focus should go after a keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "focus", content = "index", rename_all = "snake_case")]
pub enum FocusIntent {
    /// Leave focus alone.
    Stay,
    /// Focus the cell at this index.
    Cell(usize),
    /// Backspace emptied the first cell; there is no previous cell.
    BeforeFirst,
    /// The last cell was filled; release focus.
    PastLast,
}

/// Result of [`CodeEngine::apply_character`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOutcome {
    /// Focus movement requested by the keystroke.
    pub focus: FocusIntent,
    /// Events produced by the keystroke.
    pub events: Vec<EngineEvent>,
}

impl KeyOutcome {
    const fn ignored() -> Self {
        Self {
            focus: FocusIntent::Stay,
            events: Vec::new(),
        }
    }
}

/// Builder for [`CodeEngine`].
pub struct EngineBuilder {
    shape: CodeShape,
    value: Option<String>,
    validator: Option<ValidatorRule>,
    char_transform: Option<CharTransform>,
    paste_parser: Option<PasteParser>,
    automatically_submit: bool,
}

impl EngineBuilder {
    /// Initial code, split and validated against the shape.
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Rule every stored character must satisfy.
    #[must_use]
    pub fn validator(mut self, rule: ValidatorRule) -> Self {
        self.validator = Some(rule);
        self
    }

    /// Transform for manually typed characters, e.g. uppercasing.
    #[must_use]
    pub fn char_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(char) -> char + Send + Sync + 'static,
    {
        self.char_transform = Some(Arc::new(transform));
        self
    }

    /// Parser replacing the fixed-width split for bulk text.
    #[must_use]
    pub fn paste_parser(mut self, parser: PasteParser) -> Self {
        self.paste_parser = Some(parser);
        self
    }

    /// Whether completing the last cell by hand also submits. Defaults to on.
    #[must_use]
    pub fn automatically_submit(mut self, enabled: bool) -> Self {
        self.automatically_submit = enabled;
        self
    }

    /// Builds the engine.
    #[must_use]
    pub fn build(self) -> CodeEngine {
        let state = self.value.as_deref().map_or_else(
            || self.shape.empty_state(),
            |value| self.shape.split(value, self.validator.as_ref()),
        );
        CodeEngine {
            shape: self.shape,
            state,
            validator: self.validator,
            char_transform: self.char_transform,
            paste_parser: self.paste_parser,
            automatically_submit: self.automatically_submit,
        }
    }
}

impl fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("shape", &self.shape)
            .field("value", &self.value)
            .field("validator", &self.validator)
            .field("automatically_submit", &self.automatically_submit)
            .finish_non_exhaustive()
    }
}

/// Owns the cell values of one code entry session.
pub struct CodeEngine {
    shape: CodeShape,
    state: CodeState,
    validator: Option<ValidatorRule>,
    char_transform: Option<CharTransform>,
    paste_parser: Option<PasteParser>,
    automatically_submit: bool,
}

impl CodeEngine {
    /// Starts configuring an engine for `shape`.
    #[must_use]
    pub const fn builder(shape: CodeShape) -> EngineBuilder {
        EngineBuilder {
            shape,
            value: None,
            validator: None,
            char_transform: None,
            paste_parser: None,
            automatically_submit: true,
        }
    }

    /// An engine with default settings for the given cell capacities.
    ///
    /// # Errors
    ///
    /// Fails if the shape is empty or declares a zero-capacity cell.
    pub fn with_shape(cells: impl Into<Vec<usize>>) -> Result<Self, ShapeError> {
        Ok(Self::builder(CodeShape::new(cells)?).build())
    }

    /// The shape this engine was built for.
    #[must_use]
    pub const fn shape(&self) -> &CodeShape {
        &self.shape
    }

    /// Current cell values.
    #[must_use]
    pub const fn state(&self) -> &CodeState {
        &self.state
    }

    /// Current cells joined into one string.
    #[must_use]
    pub fn code(&self) -> String {
        self.state.join()
    }

    /// Weak readiness: every cell is non-empty.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    /// Strict completeness of the current state.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.shape
            .is_complete(self.state.cells(), self.validator.as_ref())
    }

    /// Applies one keystroke to the cell at `index`.
    ///
    /// Rejected characters and out-of-range cells leave the state untouched.
    /// A character typed into a full cell replaces its value. Filling the
    /// last cell of a strictly complete code emits a manual
    /// [`EngineEvent::CodeEntered`], followed by a manual submission when
    /// automatic submission is on.
    pub fn apply_character(&mut self, key: Key, index: usize) -> KeyOutcome {
        if !accept(key, self.validator.as_ref()) {
            debug!("ignoring rejected key {key:?} for cell {index}");
            return KeyOutcome::ignored();
        }
        let Some(capacity) = self.shape.capacity(index) else {
            warn!(
                "ignoring key for cell {index}, shape only has {} cells",
                self.shape.cell_count()
            );
            return KeyOutcome::ignored();
        };

        let key = match key {
            Key::Char(c) => Key::Char(self.char_transform.as_ref().map_or(c, |t| t(c))),
            Key::Backspace => Key::Backspace,
        };
        let Some(cell) = self.state.cell_mut(index) else {
            return KeyOutcome::ignored();
        };
        let before = cell.clone();
        match key {
            Key::Backspace => {
                cell.pop();
            }
            Key::Char(c) => {
                if cell.chars().count() >= capacity {
                    cell.clear();
                }
                cell.push(c);
            }
        }
        let length = cell.chars().count();
        let changed = *cell != before;

        let focus = if key == Key::Backspace && length == 0 {
            index
                .checked_sub(1)
                .map_or(FocusIntent::BeforeFirst, FocusIntent::Cell)
        } else if length == capacity {
            if index + 1 == self.shape.cell_count() {
                FocusIntent::PastLast
            } else {
                FocusIntent::Cell(index + 1)
            }
        } else {
            FocusIntent::Stay
        };
        debug!("cell {index} is now {length}/{capacity} characters, focus {focus:?}");

        let mut events = Vec::new();
        if changed {
            events.push(self.changed_event());
        }
        if focus == FocusIntent::PastLast && self.is_complete() {
            let code = self.code();
            info!("code entered manually");
            events.push(EngineEvent::CodeEntered(CompletionEvent {
                code,
                origin: CodeOrigin::Manual,
            }));
            if self.automatically_submit {
                events.push(EngineEvent::Submitted(self.submit(CodeOrigin::Manual)));
            }
        }
        KeyOutcome { focus, events }
    }

    /// Applies pasted text to all cells at once.
    ///
    /// The text is split by the configured paste parser, or fixed-width by
    /// default. Only a strictly complete candidate is accepted; it replaces
    /// the state wholesale and is entered and submitted as
    /// [`CodeOrigin::PastedOrSms`]. Anything else is dropped without events.
    pub fn apply_bulk_text(&mut self, raw: &str) -> Vec<EngineEvent> {
        let candidate = self.paste_parser.as_ref().map_or_else(
            || self.shape.split_raw(raw),
            |parser| parser(raw, &self.shape),
        );
        self.replace_if_complete(candidate)
    }

    /// Applies a bare code, such as one extracted from an SMS, to all cells.
    ///
    /// Always split by position; the paste parser only applies to pasted
    /// text. Acceptance and events are the same as for
    /// [`CodeEngine::apply_bulk_text`].
    pub fn apply_code(&mut self, code: &str) -> Vec<EngineEvent> {
        let candidate = self.shape.split_raw(code);
        self.replace_if_complete(candidate)
    }

    fn replace_if_complete(&mut self, candidate: Vec<String>) -> Vec<EngineEvent> {
        if !self
            .shape
            .is_complete(candidate.as_slice(), self.validator.as_ref())
        {
            debug!("dropping bulk text that does not fill the shape: {candidate:?}");
            return Vec::new();
        }

        self.state = CodeState::from_cells(candidate);
        info!("code entered by paste or SMS");
        vec![
            self.changed_event(),
            EngineEvent::CodeEntered(CompletionEvent {
                code: self.code(),
                origin: CodeOrigin::PastedOrSms,
            }),
            EngineEvent::Submitted(self.submit(CodeOrigin::PastedOrSms)),
        ]
    }

    /// Reports the current code with its strict validity.
    #[must_use]
    pub fn submit(&self, origin: CodeOrigin) -> SubmissionResult {
        let is_valid = self.is_complete();
        info!("submitting code (origin {origin:?}, valid {is_valid})");
        SubmissionResult {
            is_valid,
            code: self.code(),
            origin,
        }
    }

    /// Replaces the state with the validated split of `code`.
    ///
    /// Used when the owner overrides the value; never enters or submits.
    pub fn set_value(&mut self, code: &str) -> Vec<EngineEvent> {
        let next = self.shape.split(code, self.validator.as_ref());
        if next == self.state {
            return Vec::new();
        }
        self.state = next;
        vec![self.changed_event()]
    }

    fn changed_event(&self) -> EngineEvent {
        EngineEvent::Changed {
            code: self.code(),
            cells: self.state.cells().to_vec(),
        }
    }
}

impl fmt::Debug for CodeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeEngine")
            .field("shape", &self.shape)
            .field("state", &self.state)
            .field("validator", &self.validator)
            .field("automatically_submit", &self.automatically_submit)
            .finish_non_exhaustive()
    }
}
