//! The operator loop: reads commands and drives the controller and scanner.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use apm_relay_core::Error;
use apm_relay_scanner::{CancelToken, Scanner};
use apm_relay_session::SessionController;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::commands::{OperatorCommand, COMMAND_HELP};
use crate::console::{describe_readiness, ConsoleObserver};

/// Ties operator input to the workflow.
pub struct Relay {
    controller: SessionController,
    scanner: Arc<Scanner>,
    cancel: CancelToken,
    console: Arc<ConsoleObserver>,
    scanned: Arc<Mutex<Option<String>>>,
    scanning: Arc<AtomicBool>,
    scan_task: Option<JoinHandle<()>>,
}

impl Relay {
    /// Relay over a running controller and a scanner whose preview is
    /// cancelled through `cancel`.
    pub fn new(
        controller: SessionController,
        scanner: Arc<Scanner>,
        cancel: CancelToken,
        console: Arc<ConsoleObserver>,
    ) -> Self {
        Self {
            controller,
            scanner,
            cancel,
            console,
            scanned: Arc::new(Mutex::new(None)),
            scanning: Arc::new(AtomicBool::new(false)),
            scan_task: None,
        }
    }

    /// Last value read by `scan`, if any.
    pub fn scanned(&self) -> Option<String> {
        lock(&self.scanned).clone()
    }

    /// Process commands until `quit` or end of input, then stop the
    /// controller once running actions have reported.
    pub async fn run<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        if self.scanner.is_available() {
            self.console.note("info", "Ready. Type 'help' for commands.");
        } else {
            let reason = self.scanner.unavailable_reason().unwrap_or("unknown");
            self.console.note(
                "info",
                &format!("Ready (scanning unavailable: {}). Type 'help' for commands.", reason),
            );
        }

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<OperatorCommand>() {
                Ok(OperatorCommand::Quit) => break,
                Ok(command) => self.execute(command).await?,
                Err(e) => self.console.note("input_error", &e.to_string()),
            }
        }

        self.finish().await
    }

    /// Run one command.
    pub async fn execute(&mut self, command: OperatorCommand) -> Result<()> {
        debug!("Operator command: {:?}", command);
        match command {
            OperatorCommand::Primary => self.controller.login_primary()?,
            OperatorCommand::Secondary => self.controller.login_secondary()?,
            OperatorCommand::Submit(Some(value)) => self.controller.submit_identifier(value)?,
            OperatorCommand::Submit(None) => match self.scanned() {
                Some(value) => self.controller.submit_identifier(value)?,
                None => self
                    .console
                    .note("input_error", "Nothing scanned yet; use 'submit NUMBER'"),
            },
            OperatorCommand::Scan => self.start_scan(),
            OperatorCommand::Cancel => {
                if self.scanning.load(Ordering::SeqCst) {
                    self.cancel.cancel();
                } else {
                    self.console.note("input_error", "No scan is running");
                }
            }
            OperatorCommand::Finish => self.controller.finish_primary()?,
            OperatorCommand::Reset => {
                self.controller.reset().await?;
                lock(&self.scanned).take();
            }
            OperatorCommand::Status => {
                let readiness = self.controller.readiness().await?;
                let mut text = describe_readiness(&readiness);
                if let Some(value) = self.scanned() {
                    text.push_str(&format!(", scanned {}", value));
                }
                self.console.note("status", &text);
            }
            OperatorCommand::Help => self.console.note("help", COMMAND_HELP),
            OperatorCommand::Quit => {}
        }
        Ok(())
    }

    fn start_scan(&mut self) {
        if let Some(reason) = self.scanner.unavailable_reason() {
            let error = Error::CapabilityUnavailable(reason.to_string());
            self.console.note("scan_error", &error.to_string());
            return;
        }
        if self.scanning.swap(true, Ordering::SeqCst) {
            self.console.note("input_error", "A scan is already running");
            return;
        }
        // cleared before the worker exists, so a cancel that follows at once still lands
        self.cancel.reset();

        self.console.note(
            "info",
            "Scanning... hold the card in front of the camera ('cancel' to stop)",
        );
        let scanner = Arc::clone(&self.scanner);
        let console = Arc::clone(&self.console);
        let scanned = Arc::clone(&self.scanned);
        let scanning = Arc::clone(&self.scanning);
        self.scan_task = Some(tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || scanner.scan()).await;
            match result {
                Ok(Ok(value)) => {
                    info!("Scanned {}", value);
                    *lock(&scanned) = Some(value.clone());
                    console.note("scanned", &value);
                }
                Ok(Err(e)) => {
                    warn!("Scan failed: {}", e);
                    console.note("scan_error", &e.to_string());
                }
                Err(e) => console.note("scan_error", &format!("scan worker failed: {}", e)),
            }
            scanning.store(false, Ordering::SeqCst);
        }));
    }

    async fn finish(&mut self) -> Result<()> {
        if let Some(task) = self.scan_task.take() {
            if self.scanning.load(Ordering::SeqCst) {
                self.cancel.cancel();
            }
            if let Err(e) = task.await {
                warn!("Scan task ended abnormally: {}", e);
            }
        }
        match self.controller.shutdown().await {
            Ok(()) | Err(Error::ControllerClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
