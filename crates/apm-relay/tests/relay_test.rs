//! End-to-end operator sessions against fake applications and a scripted camera.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use apm_relay::{ConsoleObserver, Relay};
use apm_relay_automation::AutomationClient;
use apm_relay_core::{Result, ScannerSettings};
use apm_relay_scanner::testing::{barcode_frame, blank_frame, ScriptedSource};
use apm_relay_scanner::{CancelToken, Code128Decoder, HeadlessSurface, ScanBackend, Scanner};
use apm_relay_session::SessionController;
use tokio::io::{AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

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
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

struct FakeApp {
    name: &'static str,
    calls: Arc<Mutex<Vec<String>>>,
}

impl AutomationClient for FakeApp {
    fn name(&self) -> &str {
        self.name
    }
    fn launch(&self) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{}:launch", self.name));
        Ok(())
    }
    fn login(&self) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{}:login", self.name));
        Ok(())
    }
    fn enter_identifier(&self, value: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:enter:{}", self.name, value));
        Ok(())
    }
    fn minimize(&self) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{}:minimize", self.name));
        Ok(())
    }
}

struct Session {
    input: DuplexStream,
    output: Buffer,
    calls: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<anyhow::Result<()>>,
}

impl Session {
    fn start(scan_backend: apm_relay_core::Result<ScanBackend>, cancel: CancelToken) -> Self {
        let output = Buffer::default();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let console = Arc::new(ConsoleObserver::new(Box::new(output.clone()), false));

        let controller = SessionController::builder()
            .primary(Arc::new(FakeApp {
                name: "Frista",
                calls: Arc::clone(&calls),
            }))
            .secondary(Arc::new(FakeApp {
                name: "After",
                calls: Arc::clone(&calls),
            }))
            .observer(console.clone())
            .settle_delay(Duration::from_millis(10))
            .build()
            .unwrap();
        let settings = ScannerSettings {
            scan_timeout_ms: 3000,
            ..ScannerSettings::default()
        };
        let scanner = Scanner::new(settings, scan_backend);

        let (input, reader) = tokio::io::duplex(1024);
        let mut relay = Relay::new(controller, Arc::new(scanner), cancel, console);
        let task = tokio::spawn(async move { relay.run(BufReader::new(reader)).await });

        Self {
            input,
            output,
            calls,
            task,
        }
    }

    fn with_camera(source: &ScriptedSource) -> Self {
        let cancel = CancelToken::new();
        let backend = ScanBackend::probe(
            Some(Arc::new(source.clone())),
            Some(Arc::new(Code128Decoder::new())),
            Some(Arc::new(HeadlessSurface::new(cancel.clone()))),
        );
        Self::start(backend, cancel)
    }

    async fn send(&mut self, line: &str) {
        self.input
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .unwrap();
    }

    async fn wait_for(&self, needle: &str) {
        for _ in 0..500 {
            if self.output.text().contains(needle) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("'{}' never printed; output:\n{}", needle, self.output.text());
    }

    async fn quit(self) -> (String, Vec<String>) {
        self.quit_after("").await
    }

    /// Send `lines` and `quit` in one write, then wait for the relay to stop.
    async fn quit_after(mut self, lines: &str) -> (String, Vec<String>) {
        self.send(&format!("{}\nquit", lines)).await;
        self.task.await.unwrap().unwrap();
        let calls = self.calls.lock().unwrap().clone();
        (self.output.text(), calls)
    }
}

#[tokio::test]
async fn test_scan_then_submit_scanned_value() {
    let source = ScriptedSource::new(vec![Some(blank_frame()), Some(barcode_frame("4410023"))]);
    let mut session = Session::with_camera(&source);

    session.send("primary").await;
    session.wait_for("primary_login ok").await;
    session.send("secondary").await;
    session.wait_for("secondary_login ok").await;
    session.send("scan").await;
    session.wait_for("] 4410023").await;
    session.send("submit").await;
    session.wait_for("submit ok").await;

    let (output, calls) = session.quit().await;
    assert!(output.contains("4410023 sent to Frista and After"));
    assert_eq!(
        calls,
        vec![
            "Frista:launch",
            "Frista:login",
            "After:launch",
            "After:login",
            "Frista:enter:4410023",
            "After:enter:4410023",
        ]
    );
    assert_eq!(source.releases(), 1);
}

#[tokio::test]
async fn test_scan_unavailable_never_opens_camera() {
    let source = ScriptedSource::new(vec![Some(barcode_frame("1"))]);
    let cancel = CancelToken::new();
    let backend = ScanBackend::probe(
        Some(Arc::new(source.clone())),
        Some(Arc::new(Code128Decoder::new())),
        None,
    );
    let mut session = Session::start(backend, cancel);

    session.wait_for("scanning unavailable: missing preview").await;
    session.send("scan").await;
    session.wait_for("Capability unavailable: missing preview").await;

    session.quit().await;
    assert_eq!(source.opens(), 0);
}

#[tokio::test]
async fn test_cancel_stops_running_scan() {
    let source = ScriptedSource::new(vec![Some(blank_frame())]);
    let mut session = Session::with_camera(&source);

    session.send("scan").await;
    session.wait_for("Scanning...").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    session.send("cancel").await;
    session.wait_for("Scan cancelled by operator").await;

    session.quit().await;
    assert_eq!(source.releases(), 1);
}

#[tokio::test]
async fn test_cancel_sent_with_scan_stops_it() {
    let source = ScriptedSource::new(vec![Some(blank_frame())]);
    let mut session = Session::with_camera(&source);

    let started = Instant::now();
    session.send("scan\ncancel").await;
    session.wait_for("Scan cancelled by operator").await;
    assert!(started.elapsed() < Duration::from_millis(1500));

    let (output, _) = session.quit().await;
    assert!(!output.contains("timed out"));
    assert_eq!(source.releases(), 1);
}

#[tokio::test]
async fn test_quit_right_after_scan_does_not_wait_for_timeout() {
    let source = ScriptedSource::new(vec![Some(blank_frame())]);
    let session = Session::with_camera(&source);

    let started = Instant::now();
    let (output, _) = session.quit_after("scan").await;
    assert!(started.elapsed() < Duration::from_millis(1500));
    assert!(output.contains("Scan cancelled by operator"));
    assert_eq!(source.releases(), 1);
}

#[tokio::test]
async fn test_idle_cancel_does_not_abort_next_scan() {
    let source = ScriptedSource::new(vec![Some(blank_frame()), Some(barcode_frame("90210"))]);
    let mut session = Session::with_camera(&source);

    session.send("cancel").await;
    session.wait_for("No scan is running").await;
    session.send("scan").await;
    session.wait_for("] 90210").await;

    let (output, _) = session.quit().await;
    assert!(!output.contains("Scan cancelled by operator"));
}

#[tokio::test]
async fn test_operator_mistakes_are_reported() {
    let source = ScriptedSource::new(vec![Some(blank_frame())]);
    let mut session = Session::with_camera(&source);

    session.send("submit").await;
    session.wait_for("Nothing scanned yet").await;
    session.send("launch").await;
    session.wait_for("unknown command 'launch'").await;
    session.send("secondary").await;
    session.wait_for("secondary_login failed").await;
    session.send("status").await;
    session.wait_for("primary not ready, secondary not ready").await;

    let (_, calls) = session.quit().await;
    assert!(calls.is_empty());
}

#[tokio::test]
async fn test_reset_then_status() {
    let source = ScriptedSource::new(vec![Some(blank_frame())]);
    let mut session = Session::with_camera(&source);

    session.send("primary").await;
    session.wait_for("primary_login ok").await;
    session.send("status").await;
    session.wait_for("primary ready, secondary not ready").await;
    session.send("reset").await;
    session.wait_for("reset ok").await;

    let (output, _) = session.quit().await;
    assert!(output.contains("Workflow reset"));
}
