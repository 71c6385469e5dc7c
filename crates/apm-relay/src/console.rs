//! Console observer: prints controller events for the operator.

use std::io::Write;
use std::sync::Mutex;

use apm_relay_core::{ActionOutcome, Readiness};
use apm_relay_session::{SessionEvent, SessionObserver};
use chrono::Local;
use serde::Serialize;

/// JSON line wrapper adding a timestamp.
#[derive(Serialize)]
struct Stamped<'a> {
    timestamp: String,
    #[serde(flatten)]
    event: &'a ConsoleEvent,
}

/// Everything the console prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
enum ConsoleEvent {
    Session(SessionEvent),
    Note { event: &'static str, text: String },
}

/// Prints controller events as timestamped text or JSON lines.
pub struct ConsoleObserver {
    out: Mutex<Box<dyn Write + Send>>,
    json: bool,
}

impl ConsoleObserver {
    /// Observer writing to stdout.
    pub fn stdout(json: bool) -> Self {
        Self::new(Box::new(std::io::stdout()), json)
    }

    /// Observer writing to `out`.
    pub fn new(out: Box<dyn Write + Send>, json: bool) -> Self {
        Self {
            out: Mutex::new(out),
            json,
        }
    }

    /// Print a relay message that is not a controller event, e.g. a scan
    /// result or help text. `kind` tags the JSON line.
    pub fn note(&self, kind: &'static str, text: &str) {
        self.emit(ConsoleEvent::Note {
            event: kind,
            text: text.to_string(),
        });
    }

    fn emit(&self, event: ConsoleEvent) {
        let line = if self.json {
            let stamped = Stamped {
                timestamp: Local::now().to_rfc3339(),
                event: &event,
            };
            match serde_json::to_string(&stamped) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("Cannot encode console event: {}", e);
                    return;
                }
            }
        } else {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), render(&event))
        };

        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            tracing::warn!("Console write failed: {}", e);
        }
    }
}

fn ready_word(ready: bool) -> &'static str {
    if ready {
        "ready"
    } else {
        "not ready"
    }
}

/// Text form of readiness, shared with the `status` command.
pub fn describe_readiness(readiness: &Readiness) -> String {
    format!(
        "primary {}, secondary {}",
        ready_word(readiness.primary_ready),
        ready_word(readiness.secondary_ready)
    )
}

fn render(event: &ConsoleEvent) -> String {
    match event {
        ConsoleEvent::Session(SessionEvent::Status { text }) => text.clone(),
        ConsoleEvent::Session(SessionEvent::Readiness(readiness)) => {
            format!("readiness: {}", describe_readiness(readiness))
        }
        ConsoleEvent::Session(SessionEvent::Error { message }) => format!("error: {}", message),
        ConsoleEvent::Session(SessionEvent::Action(outcome)) => format!(
            "{} {}",
            outcome.action,
            if outcome.succeeded { "ok" } else { "failed" }
        ),
        ConsoleEvent::Note { text, .. } => text.clone(),
    }
}

impl SessionObserver for ConsoleObserver {
    fn on_status(&self, text: &str) {
        self.emit(ConsoleEvent::Session(SessionEvent::Status {
            text: text.to_string(),
        }));
    }

    fn on_readiness(&self, readiness: Readiness) {
        self.emit(ConsoleEvent::Session(SessionEvent::Readiness(readiness)));
    }

    fn on_error(&self, message: &str) {
        self.emit(ConsoleEvent::Session(SessionEvent::Error {
            message: message.to_string(),
        }));
    }

    fn on_action(&self, outcome: ActionOutcome) {
        self.emit(ConsoleEvent::Session(SessionEvent::Action(outcome)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apm_relay_core::ActionKind;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    #[test]
    fn test_text_lines() {
        let buffer = Buffer::default();
        let console = ConsoleObserver::new(Box::new(buffer.clone()), false);
        console.on_status("Opening Frista...");
        console.on_action(ActionOutcome::failure(ActionKind::PrimaryLogin));
        console.on_readiness(Readiness {
            primary_ready: true,
            secondary_ready: false,
        });

        let lines = buffer.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] Opening Frista..."));
        assert!(lines[1].ends_with("primary_login failed"));
        assert!(lines[2].ends_with("readiness: primary ready, secondary not ready"));
    }

    #[test]
    fn test_json_lines() {
        let buffer = Buffer::default();
        let console = ConsoleObserver::new(Box::new(buffer.clone()), true);
        console.on_error("Primary login failed (Frista): boom");
        console.note("scanned", "123456");

        let lines = buffer.lines();
        let error: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(error["event"], "error");
        assert_eq!(error["message"], "Primary login failed (Frista): boom");
        assert!(error["timestamp"].is_string());

        let note: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(note["event"], "scanned");
        assert_eq!(note["text"], "123456");
    }
}
