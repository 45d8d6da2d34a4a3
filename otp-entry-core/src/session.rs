// File:    session.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Observable entry session wiring the engine to UI cells, focus control and SMS delivery.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Observable code entry sessions.
//!
//! An [`OtpSession`] is a cheap, cloneable handle around a [`CodeEngine`].
//! UI layers feed it cell events and subscribe to [`SessionEvent`]s. Observers
//! run after the engine state is committed and with no borrow held, so they
//! may call straight back into the session.

use crate::engine::{
    CodeEngine, CodeOrigin, CompletionEvent, EngineEvent, FocusIntent, SubmissionResult,
};
use crate::paste::resolve_inserted;
use crate::receiver::{OtpReceiver, SmsPayload, Subscription};
use crate::shape::{CodeShape, CodeState};
use crate::sms::CodeExtractor;
use crate::validator::Key;
use log::{debug, warn};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Imperative focus handle for the rendered cells.
pub trait FocusController {
    /// Moves input focus to the cell at `index`.
    fn focus(&self, index: usize);
    /// Removes input focus from the cell at `index`.
    fn blur(&self, index: usize);
}

/// Everything a session reports to its observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
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
    /// The SMS listener reported an error such as `TIMEOUT`.
    SmsError {
        /// The error kind.
        error: String,
    },
    /// The focused cell changed; `None` means no cell is focused.
    FocusChanged {
        /// The newly focused cell.
        index: Option<usize>,
    },
}

impl From<EngineEvent> for SessionEvent {
    fn from(event: EngineEvent) -> Self {
        match event {
            EngineEvent::Changed { code, cells } => Self::Changed { code, cells },
            EngineEvent::CodeEntered(entered) => Self::CodeEntered(entered),
            EngineEvent::Submitted(result) => Self::Submitted(result),
        }
    }
}

type Observer = Rc<dyn Fn(&SessionEvent)>;

struct Inner {
    engine: RefCell<CodeEngine>,
    observers: RefCell<BTreeMap<u64, Observer>>,
    next_observer_id: Cell<u64>,
    focused: Cell<Option<usize>>,
    focus_controller: RefCell<Option<Rc<dyn FocusController>>>,
    sms_extractor: Option<Box<dyn CodeExtractor>>,
    expect_sms_on_mount: bool,
}

/// Builder for [`OtpSession`].
pub struct SessionBuilder {
    engine: CodeEngine,
    sms_extractor: Option<Box<dyn CodeExtractor>>,
    focus_controller: Option<Rc<dyn FocusController>>,
    expect_sms_on_mount: bool,
}

impl SessionBuilder {
    /// Extractor turning SMS bodies into codes. Without one, messages are
    /// ignored.
    #[must_use]
    pub fn sms_extractor(mut self, extractor: impl CodeExtractor + 'static) -> Self {
        self.sms_extractor = Some(Box::new(extractor));
        self
    }

    /// Focus handle driven by keystroke focus intents.
    #[must_use]
    pub fn focus_controller(mut self, controller: impl FocusController + 'static) -> Self {
        self.focus_controller = Some(Rc::new(controller));
        self
    }

    /// Arm the receiver's SMS listener when the session is attached to it.
    #[must_use]
    pub fn expect_sms_on_mount(mut self, enabled: bool) -> Self {
        self.expect_sms_on_mount = enabled;
        self
    }

    /// Builds the session.
    #[must_use]
    pub fn build(self) -> OtpSession {
        OtpSession {
            inner: Rc::new(Inner {
                engine: RefCell::new(self.engine),
                observers: RefCell::new(BTreeMap::new()),
                next_observer_id: Cell::new(0),
                focused: Cell::new(None),
                focus_controller: RefCell::new(self.focus_controller),
                sms_extractor: self.sms_extractor,
                expect_sms_on_mount: self.expect_sms_on_mount,
            }),
        }
    }
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("engine", &self.engine)
            .field("expect_sms_on_mount", &self.expect_sms_on_mount)
            .finish_non_exhaustive()
    }
}

/// Handle to one code entry session.
#[derive(Clone)]
pub struct OtpSession {
    inner: Rc<Inner>,
}

/// Non-owning reference to a session, for callbacks the session itself owns.
#[derive(Clone)]
pub struct WeakSession {
    inner: Weak<Inner>,
}

impl WeakSession {
    /// The session, if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<OtpSession> {
        self.inner.upgrade().map(|inner| OtpSession { inner })
    }
}

impl fmt::Debug for WeakSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakSession")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl OtpSession {
    /// Starts configuring a session around `engine`.
    #[must_use]
    pub const fn builder(engine: CodeEngine) -> SessionBuilder {
        SessionBuilder {
            engine,
            sms_extractor: None,
            focus_controller: None,
            expect_sms_on_mount: false,
        }
    }

    /// A session with no SMS extractor and no focus controller.
    #[must_use]
    pub fn new(engine: CodeEngine) -> Self {
        Self::builder(engine).build()
    }

    /// A reference that does not keep the session alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakSession {
        WeakSession {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Registers an observer for every future event.
    pub fn subscribe(&self, observer: impl Fn(&SessionEvent) + 'static) -> Subscription {
        let id = self.inner.next_observer_id.get();
        self.inner.next_observer_id.set(id.saturating_add(1));
        self.inner
            .observers
            .borrow_mut()
            .insert(id, Rc::new(observer));

        let inner = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.observers.borrow_mut().remove(&id);
            }
        })
    }

    /// Installs or replaces the focus handle.
    pub fn set_focus_controller(&self, controller: impl FocusController + 'static) {
        *self.inner.focus_controller.borrow_mut() = Some(Rc::new(controller));
    }

    /// The cell shape.
    #[must_use]
    pub fn shape(&self) -> CodeShape {
        self.inner.engine.borrow().shape().clone()
    }

    /// Snapshot of the current cell values.
    #[must_use]
    pub fn snapshot(&self) -> CodeState {
        self.inner.engine.borrow().state().clone()
    }

    /// The current code, cells joined.
    #[must_use]
    pub fn code(&self) -> String {
        self.inner.engine.borrow().code()
    }

    /// Weak readiness, for enabling a submit button.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.engine.borrow().is_ready()
    }

    /// Strict completeness of the current code.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.inner.engine.borrow().is_complete()
    }

    /// The cell that currently holds focus.
    #[must_use]
    pub fn focused_index(&self) -> Option<usize> {
        self.inner.focused.get()
    }

    /// A cell reports that it gained focus.
    pub fn on_focus(&self, index: usize) {
        self.set_focused(Some(index));
    }

    /// A cell reports that it lost focus.
    pub fn on_blur(&self) {
        self.set_focused(None);
    }

    /// A key was pressed in the cell at `index`.
    ///
    /// Applies the key, notifies observers and then moves focus through the
    /// focus controller: into the requested cell, or off the last cell once
    /// it is filled.
    pub fn key_press(&self, key: Key, index: usize) -> FocusIntent {
        let outcome = self.inner.engine.borrow_mut().apply_character(key, index);
        self.emit_all(outcome.events);

        let controller = self.inner.focus_controller.borrow().clone();
        if let Some(controller) = controller {
            match outcome.focus {
                FocusIntent::Cell(next) => controller.focus(next),
                FocusIntent::PastLast => controller.blur(index),
                FocusIntent::Stay | FocusIntent::BeforeFirst => {}
            }
        }
        outcome.focus
    }

    /// The text of the cell at `index` changed to `observed` in one step,
    /// as it does after a paste or an autofill suggestion.
    ///
    /// Values shorter than the full code are ignored; key presses handle
    /// those. Otherwise the inserted text is recovered and applied in bulk.
    pub fn text_changed(&self, index: usize, observed: &str) {
        let inserted = {
            let engine = self.inner.engine.borrow();
            if observed.chars().count() < engine.shape().full_length() {
                return;
            }
            let previous = engine.state().cell(index).unwrap_or_default();
            resolve_inserted(previous, observed).map(str::to_string)
        };
        if let Some(text) = inserted {
            self.paste(&text);
        }
    }

    /// Applies pasted text to all cells.
    pub fn paste(&self, text: &str) {
        let events = self.inner.engine.borrow_mut().apply_bulk_text(text);
        self.emit_all(events);
    }

    /// Handles one payload from the SMS listener.
    ///
    /// Errors are forwarded to observers. Messages go through the SMS
    /// extractor and the extracted code is split by position into the cells;
    /// the paste parser is not involved.
    pub fn receive_sms(&self, payload: &SmsPayload) {
        if let Some(error) = &payload.error {
            warn!("SMS listener reported {error}");
            self.emit(&SessionEvent::SmsError {
                error: error.clone(),
            });
            return;
        }
        let Some(extractor) = self.inner.sms_extractor.as_deref() else {
            debug!("no SMS extractor configured, ignoring message");
            return;
        };
        let code = extractor.extract(payload.message.as_deref().unwrap_or_default());
        match code {
            Some(code) if !code.is_empty() => {
                let events = self.inner.engine.borrow_mut().apply_code(&code);
                self.emit_all(events);
            }
            _ => debug!("no code found in SMS message"),
        }
    }

    /// Explicit submit action: reports the current code and its validity.
    pub fn submit(&self) -> SubmissionResult {
        let result = self
            .inner
            .engine
            .borrow()
            .submit(CodeOrigin::ExplicitSubmit);
        self.emit(&SessionEvent::Submitted(result.clone()));
        result
    }

    /// Overrides the code from outside, e.g. a restored form value.
    pub fn set_value(&self, code: &str) {
        let events = self.inner.engine.borrow_mut().set_value(code);
        self.emit_all(events);
    }

    /// Subscribes the session to `receiver`, arming it first if configured.
    ///
    /// The returned subscription detaches the session again; the session also
    /// stops reacting once it is dropped.
    pub fn attach(&self, receiver: &dyn OtpReceiver) -> Subscription {
        let session = self.downgrade();
        let subscription = receiver.subscribe(Box::new(move |payload: &SmsPayload| {
            if let Some(session) = session.upgrade() {
                session.receive_sms(payload);
            }
        }));

        if self.inner.expect_sms_on_mount {
            if receiver.supports_sms_retrieval() {
                match receiver.expect_incoming_code() {
                    Ok(armed) => debug!("SMS listener armed: {armed}"),
                    Err(e) => warn!("could not arm SMS listener ({}): {e}", e.kind()),
                }
            } else {
                debug!("SMS retrieval unsupported, not arming listener");
            }
        }
        subscription
    }

    fn set_focused(&self, index: Option<usize>) {
        if self.inner.focused.replace(index) != index {
            self.emit(&SessionEvent::FocusChanged { index });
        }
    }

    fn emit_all(&self, events: Vec<EngineEvent>) {
        for event in events {
            self.emit(&event.into());
        }
    }

    fn emit(&self, event: &SessionEvent) {
        let observers: Vec<Observer> = self.inner.observers.borrow().values().cloned().collect();
        for observer in observers {
            observer(event);
        }
    }
}

impl fmt::Debug for OtpSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtpSession")
            .field("engine", &self.inner.engine)
            .field("focused", &self.inner.focused.get())
            .field("observers", &self.inner.observers.borrow().len())
            .finish_non_exhaustive()
    }
}
