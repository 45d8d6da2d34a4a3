// File:    receiver.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Boundary to the platform SMS retriever and phone number hint services.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Platform receivers for incoming SMS codes and phone number hints.
//!
//! The [`OtpReceiver`] trait is the capability boundary. Platforms without SMS
//! retrieval use [`UnsupportedReceiver`]; [`LoopbackReceiver`] delivers
//! payloads in-process and backs tests and the CLI.

use crate::error::ReceiverError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Error kind reported when the SMS wait expired without a message.
pub const TIMEOUT: &str = "TIMEOUT";

/// One notification from the SMS listener.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsPayload {
    /// Full text of the received message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error kind, e.g. [`TIMEOUT`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SmsPayload {
    /// A payload carrying a received message.
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: Some(text.into()),
            error: None,
        }
    }

    /// A payload carrying an error kind.
    #[must_use]
    pub fn error(kind: impl Into<String>) -> Self {
        Self {
            message: None,
            error: Some(kind.into()),
        }
    }

    /// The listener timed out.
    #[must_use]
    pub fn timeout() -> Self {
        Self::error(TIMEOUT)
    }

    /// Whether this payload reports a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.error.as_deref() == Some(TIMEOUT)
    }
}

/// Callback invoked for every payload delivered to a subscription.
pub type SmsHandler = Box<dyn Fn(&SmsPayload)>;

/// Cancellation handle for a registered callback.
///
/// Dropping the handle leaves the registration in place; cancelling is
/// explicit and may be repeated.
#[must_use = "the registration stays active until `unsubscribe` is called"]
pub struct Subscription {
    cancel: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
    /// Wraps the action that removes the registration.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: RefCell::new(Some(Box::new(cancel))),
        }
    }

    /// A subscription that was never registered anywhere.
    pub fn inert() -> Self {
        Self {
            cancel: RefCell::new(None),
        }
    }

    /// Removes the registration. Later calls do nothing.
    pub fn unsubscribe(&self) {
        let cancel = self.cancel.borrow_mut().take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }

    /// Whether `unsubscribe` still has something to remove.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.cancel.borrow().is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Platform services feeding codes into a session.
pub trait OtpReceiver {
    /// Whether this platform can retrieve SMS codes automatically.
    fn supports_sms_retrieval(&self) -> bool;

    /// Whether this platform offers a phone number hint picker.
    fn supports_phone_hint(&self) -> bool;

    /// Arms a short-lived listener for an incoming code message.
    ///
    /// # Errors
    ///
    /// [`ReceiverError::ListenerStartFailed`] when the platform refuses.
    fn expect_incoming_code(&self) -> Result<bool, ReceiverError>;

    /// Asks the user to pick one of the device's phone numbers.
    ///
    /// # Errors
    ///
    /// [`ReceiverError::HintFailed`] on cancellation or platform failure, and
    /// [`ReceiverError::Unsupported`] where no picker exists.
    fn request_phone_number_hint(&self) -> Result<String, ReceiverError>;

    /// Registers `handler` for every payload delivered from now on.
    fn subscribe(&self, handler: SmsHandler) -> Subscription;
}

/// Fallback for platforms without SMS retrieval or phone hints.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedReceiver;

impl OtpReceiver for UnsupportedReceiver {
    fn supports_sms_retrieval(&self) -> bool {
        false
    }

    fn supports_phone_hint(&self) -> bool {
        false
    }

    fn expect_incoming_code(&self) -> Result<bool, ReceiverError> {
        Ok(false)
    }

    fn request_phone_number_hint(&self) -> Result<String, ReceiverError> {
        Err(ReceiverError::Unsupported("phone number hint"))
    }

    fn subscribe(&self, _handler: SmsHandler) -> Subscription {
        Subscription::inert()
    }
}

#[derive(Default)]
struct LoopbackState {
    handlers: RefCell<BTreeMap<u64, Rc<dyn Fn(&SmsPayload)>>>,
    next_handler_id: Cell<u64>,
    armed: Cell<bool>,
    arm_failure: RefCell<Option<String>>,
    phone_number: RefCell<Option<String>>,
}

/// In-process receiver: payloads handed to [`LoopbackReceiver::deliver`] fan
/// out to every live subscription.
#[derive(Clone, Default)]
pub struct LoopbackReceiver {
    state: Rc<LoopbackState>,
}

impl LoopbackReceiver {
    /// A receiver with no subscriptions and no phone number.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Phone number returned by the hint flow.
    #[must_use]
    pub fn with_phone_number(self, number: impl Into<String>) -> Self {
        *self.state.phone_number.borrow_mut() = Some(number.into());
        self
    }

    /// Makes the next [`OtpReceiver::expect_incoming_code`] call fail.
    pub fn fail_next_arming(&self, reason: impl Into<String>) {
        *self.state.arm_failure.borrow_mut() = Some(reason.into());
    }

    /// Whether a listener is armed and waiting for a message.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.state.armed.get()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.handlers.borrow().len()
    }

    /// Hands `payload` to every live subscription and disarms the listener.
    ///
    /// Returns how many handlers were called. Handlers may subscribe or
    /// unsubscribe while the payload is being delivered.
    pub fn deliver(&self, payload: &SmsPayload) -> usize {
        self.state.armed.set(false);
        let handlers: Vec<_> = self.state.handlers.borrow().values().cloned().collect();
        debug!("delivering SMS payload to {} subscriber(s)", handlers.len());
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }
}

impl OtpReceiver for LoopbackReceiver {
    fn supports_sms_retrieval(&self) -> bool {
        true
    }

    fn supports_phone_hint(&self) -> bool {
        true
    }

    fn expect_incoming_code(&self) -> Result<bool, ReceiverError> {
        let failure = self.state.arm_failure.borrow_mut().take();
        if let Some(reason) = failure {
            warn!("SMS listener failed to start: {reason}");
            return Err(ReceiverError::ListenerStartFailed(reason));
        }
        self.state.armed.set(true);
        Ok(true)
    }

    fn request_phone_number_hint(&self) -> Result<String, ReceiverError> {
        self.state
            .phone_number
            .borrow()
            .clone()
            .ok_or_else(|| ReceiverError::HintFailed("no phone number was selected".to_string()))
    }

    fn subscribe(&self, handler: SmsHandler) -> Subscription {
        let id = self.state.next_handler_id.get();
        self.state.next_handler_id.set(id.saturating_add(1));
        self.state
            .handlers
            .borrow_mut()
            .insert(id, Rc::from(handler));

        let state: Weak<LoopbackState> = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state.handlers.borrow_mut().remove(&id);
            }
        })
    }
}

impl fmt::Debug for LoopbackReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopbackReceiver")
            .field("subscribers", &self.subscriber_count())
            .field("armed", &self.is_armed())
            .finish_non_exhaustive()
    }
}
