//! Scripted replay of cell, paste and SMS events against a session.

use log::{debug, warn};
use otp_entry_core::session::WeakSession;
use otp_entry_core::{
    FocusController, FocusIntent, Key, LoopbackReceiver, OtpSession, SessionEvent, SmsPayload,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// One line of an event script.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ScriptStep {
    /// A single key press, `"Backspace"` or one character.
    Key { key: String, index: usize },
    /// Types `text` key by key, following focus from cell `start`.
    Type {
        text: String,
        #[serde(default)]
        start: usize,
    },
    /// The field at `index` changed to `text` in one step.
    Text { index: usize, text: String },
    /// Bulk text handed straight to the session.
    Paste { text: String },
    /// A payload from the SMS listener.
    Sms {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
    /// A cell gained focus.
    Focus { index: usize },
    /// Focus left the cells.
    Blur,
    /// The submit button was pressed.
    Submit,
    /// The owner overrode the value.
    SetValue { value: String },
}

#[derive(Serialize)]
struct FinalState<'a> {
    event: &'static str,
    code: String,
    cells: &'a [String],
    ready: bool,
    complete: bool,
    focused: Option<usize>,
}

/// Moves focus by reporting it back to the session, like a rendered cell would.
struct CellFocus {
    session: WeakSession,
}

impl FocusController for CellFocus {
    fn focus(&self, index: usize) {
        if let Some(session) = self.session.upgrade() {
            session.on_focus(index);
        }
    }

    fn blur(&self, _index: usize) {
        if let Some(session) = self.session.upgrade() {
            session.on_blur();
        }
    }
}

/// Parses a JSON-lines script. Blank lines and lines starting with `#` are skipped.
pub(crate) fn parse_script(source: &str) -> Result<Vec<ScriptStep>, String> {
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(number, line)| {
            serde_json::from_str(line).map_err(|e| format!("line {}: {e}", number + 1))
        })
        .collect()
}

/// Runs `steps` against `session`, printing each event as a JSON line and
/// finishing with a `final` line describing the resulting state.
pub(crate) fn replay(session: &OtpSession, steps: &[ScriptStep]) -> io::Result<()> {
    let receiver = LoopbackReceiver::new();
    let events: Rc<RefCell<Vec<SessionEvent>>> = Rc::default();
    let sink = Rc::clone(&events);
    let observer = session.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    session.set_focus_controller(CellFocus {
        session: session.downgrade(),
    });
    let listener = session.attach(&receiver);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for step in steps {
        debug!("replaying {step:?}");
        apply_step(session, &receiver, step);
        for event in events.borrow_mut().drain(..) {
            writeln!(out, "{}", serde_json::to_string(&event)?)?;
        }
    }

    listener.unsubscribe();
    observer.unsubscribe();

    let snapshot = session.snapshot();
    let final_state = FinalState {
        event: "final",
        code: snapshot.join(),
        cells: snapshot.cells(),
        ready: session.is_ready(),
        complete: session.is_complete(),
        focused: session.focused_index(),
    };
    writeln!(out, "{}", serde_json::to_string(&final_state)?)?;
    Ok(())
}

fn apply_step(session: &OtpSession, receiver: &LoopbackReceiver, step: &ScriptStep) {
    match step {
        ScriptStep::Key { key, index } => match Key::parse(key) {
            Some(key) => {
                session.key_press(key, *index);
            }
            None => warn!("skipping unknown key '{key}'"),
        },
        ScriptStep::Type { text, start } => {
            let mut index = *start;
            for c in text.chars() {
                match session.key_press(Key::from(c), index) {
                    FocusIntent::Cell(next) => index = next,
                    FocusIntent::PastLast => break,
                    FocusIntent::Stay | FocusIntent::BeforeFirst => {}
                }
            }
        }
        ScriptStep::Text { index, text } => session.text_changed(*index, text),
        ScriptStep::Paste { text } => session.paste(text),
        ScriptStep::Sms { message, error } => {
            let payload = SmsPayload {
                message: message.clone(),
                error: error.clone(),
            };
            receiver.deliver(&payload);
        }
        ScriptStep::Focus { index } => session.on_focus(*index),
        ScriptStep::Blur => session.on_blur(),
        ScriptStep::Submit => {
            session.submit();
        }
        ScriptStep::SetValue { value } => session.set_value(value),
    }
}
