//! Observer protocol for controller notifications.

use apm_relay_core::{ActionOutcome, Readiness};
use serde::Serialize;
use tokio::sync::mpsc;

/// Receives controller notifications.
///
/// Calls are made from the controller's consumer task, one at a time and in
/// emission order. Implementations must return promptly.
pub trait SessionObserver: Send + Sync {
    /// Human-readable progress text.
    fn on_status(&self, text: &str);

    /// Readiness snapshot after a state change.
    fn on_readiness(&self, readiness: Readiness);

    /// Human-readable failure text.
    fn on_error(&self, message: &str);

    /// Terminal outcome of one action invocation.
    fn on_action(&self, outcome: ActionOutcome);
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_status(&self, _text: &str) {}
    fn on_readiness(&self, _readiness: Readiness) {}
    fn on_error(&self, _message: &str) {}
    fn on_action(&self, _outcome: ActionOutcome) {}
}

/// One controller notification as a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Progress text
    Status {
        /// Message
        text: String,
    },
    /// Readiness snapshot
    Readiness(Readiness),
    /// Failure text
    Error {
        /// Message
        message: String,
    },
    /// Action outcome
    Action(ActionOutcome),
}

impl SessionEvent {
    /// Deliver this event to `observer`.
    pub fn dispatch(self, observer: &dyn SessionObserver) {
        match self {
            SessionEvent::Status { text } => observer.on_status(&text),
            SessionEvent::Readiness(readiness) => observer.on_readiness(readiness),
            SessionEvent::Error { message } => observer.on_error(&message),
            SessionEvent::Action(outcome) => observer.on_action(outcome),
        }
    }
}

/// Observer that forwards every notification into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelObserver {
    /// Create the observer and the receiving end.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: SessionEvent) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.tx.send(event);
    }
}

impl SessionObserver for ChannelObserver {
    fn on_status(&self, text: &str) {
        self.forward(SessionEvent::Status {
            text: text.to_string(),
        });
    }

    fn on_readiness(&self, readiness: Readiness) {
        self.forward(SessionEvent::Readiness(readiness));
    }

    fn on_error(&self, message: &str) {
        self.forward(SessionEvent::Error {
            message: message.to_string(),
        });
    }

    fn on_action(&self, outcome: ActionOutcome) {
        self.forward(SessionEvent::Action(outcome));
    }
}
