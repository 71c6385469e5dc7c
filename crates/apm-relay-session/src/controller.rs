//! Session controller.
//!
//! Entry points post commands to one consumer task. That task owns the
//! readiness flags, checks preconditions, starts a worker per accepted
//! action and turns each worker's completion into observer notifications.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use apm_relay_automation::AutomationClient;
use apm_relay_core::{
    ActionKind, ActionOutcome, AppRole, Error, Identifier, Readiness, Result, WorkflowSettings,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::observer::{NoopObserver, SessionObserver};

/// Default wait between entering the identifier in the two applications.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

enum Command {
    Login(AppRole),
    Submit(String),
    FinishPrimary,
    Reset(oneshot::Sender<Readiness>),
    Query(oneshot::Sender<Readiness>),
    Shutdown(oneshot::Sender<()>),
}

/// Which application a worker failure came from.
struct Failure {
    role: AppRole,
    error: Error,
}

impl Failure {
    fn at(role: AppRole) -> impl FnOnce(Error) -> Failure {
        move |error| Failure { role, error }
    }
}

struct Completion {
    action: ActionKind,
    invocation: Uuid,
    epoch: u64,
    identifier: Option<Identifier>,
    result: std::result::Result<(), Failure>,
}

/// Builder for [`SessionController`].
pub struct SessionControllerBuilder {
    primary: Option<Arc<dyn AutomationClient>>,
    secondary: Option<Arc<dyn AutomationClient>>,
    observer: Arc<dyn SessionObserver>,
    settle_delay: Duration,
}

impl Default for SessionControllerBuilder {
    fn default() -> Self {
        Self {
            primary: None,
            secondary: None,
            observer: Arc::new(NoopObserver),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl SessionControllerBuilder {
    /// Client for the primary application.
    pub fn primary(mut self, client: Arc<dyn AutomationClient>) -> Self {
        self.primary = Some(client);
        self
    }

    /// Client for the secondary application.
    pub fn secondary(mut self, client: Arc<dyn AutomationClient>) -> Self {
        self.secondary = Some(client);
        self
    }

    /// Where notifications go. Defaults to [`NoopObserver`].
    pub fn observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Wait between the two `enter_identifier` calls.
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Take timing from workflow settings.
    pub fn workflow(self, settings: &WorkflowSettings) -> Self {
        self.settle_delay(settings.settle_delay())
    }

    /// Start the consumer task. Must be called inside a tokio runtime.
    pub fn build(self) -> Result<SessionController> {
        let primary = self
            .primary
            .ok_or_else(|| Error::Config("primary client not set".to_string()))?;
        let secondary = self
            .secondary
            .ok_or_else(|| Error::Config("secondary client not set".to_string()))?;

        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        info!(
            "Session controller started ({} -> {}, settle {}ms)",
            primary.name(),
            secondary.name(),
            self.settle_delay.as_millis()
        );

        let state = ControllerLoop {
            primary,
            secondary,
            observer: self.observer,
            settle_delay: self.settle_delay,
            readiness: Readiness::default(),
            epoch: 0,
            in_flight: HashMap::new(),
            commands,
            commands_open: true,
            completions_tx,
            completions,
            shutdown_ack: None,
        };
        tokio::spawn(state.run());

        Ok(SessionController { tx: commands_tx })
    }
}

/// Drives the two-application login and submit workflow.
///
/// Every entry point returns as soon as the command is queued; results arrive
/// through the observer. Cloning yields another handle to the same workflow.
#[derive(Clone)]
pub struct SessionController {
    tx: mpsc::UnboundedSender<Command>,
}

impl SessionController {
    /// Start building a controller.
    pub fn builder() -> SessionControllerBuilder {
        SessionControllerBuilder::default()
    }

    fn post(&self, command: Command) -> Result<()> {
        self.tx.send(command).map_err(|_| Error::ControllerClosed)
    }

    /// Launch and log into the primary application.
    pub fn login_primary(&self) -> Result<()> {
        self.post(Command::Login(AppRole::Primary))
    }

    /// Launch and log into the secondary application. Requires the primary
    /// to be ready when the command is processed.
    pub fn login_secondary(&self) -> Result<()> {
        self.post(Command::Login(AppRole::Secondary))
    }

    /// Enter `value` in the primary, wait the settle delay, then enter it in
    /// the secondary. Requires both to be ready.
    pub fn submit_identifier(&self, value: impl Into<String>) -> Result<()> {
        self.post(Command::Submit(value.into()))
    }

    /// Minimize the primary application once it is logged in.
    pub fn finish_primary(&self) -> Result<()> {
        self.post(Command::FinishPrimary)
    }

    /// Clear both readiness flags.
    ///
    /// Resolves once the flags are cleared and the reset notifications have
    /// been delivered.
    pub async fn reset(&self) -> Result<Readiness> {
        let (ack, done) = oneshot::channel();
        self.post(Command::Reset(ack))?;
        done.await.map_err(|_| Error::ControllerClosed)
    }

    /// Current readiness snapshot.
    pub async fn readiness(&self) -> Result<Readiness> {
        let (reply, answer) = oneshot::channel();
        self.post(Command::Query(reply))?;
        answer.await.map_err(|_| Error::ControllerClosed)
    }

    /// Stop accepting commands, let running actions report, then stop.
    pub async fn shutdown(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.post(Command::Shutdown(ack))?;
        done.await.map_err(|_| Error::ControllerClosed)
    }
}

struct ControllerLoop {
    primary: Arc<dyn AutomationClient>,
    secondary: Arc<dyn AutomationClient>,
    observer: Arc<dyn SessionObserver>,
    settle_delay: Duration,
    readiness: Readiness,
    epoch: u64,
    in_flight: HashMap<ActionKind, Uuid>,
    commands: mpsc::UnboundedReceiver<Command>,
    commands_open: bool,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    shutdown_ack: Option<oneshot::Sender<()>>,
}

impl ControllerLoop {
    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv(), if self.commands_open => match command {
                    Some(command) => self.handle(command),
                    None => self.commands_open = false,
                },
                Some(done) = self.completions.recv() => self.complete(done),
                else => break,
            }
            if !self.commands_open && self.in_flight.is_empty() {
                break;
            }
        }
        info!("Session controller stopped");
        if let Some(ack) = self.shutdown_ack.take() {
            let _ = ack.send(());
        }
    }

    fn client(&self, role: AppRole) -> &Arc<dyn AutomationClient> {
        match role {
            AppRole::Primary => &self.primary,
            AppRole::Secondary => &self.secondary,
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Login(role) => self.start_login(role),
            Command::Submit(value) => self.start_submit(value),
            Command::FinishPrimary => self.start_finish(),
            Command::Reset(ack) => {
                self.reset();
                let _ = ack.send(self.readiness);
            }
            Command::Query(reply) => {
                let _ = reply.send(self.readiness);
            }
            Command::Shutdown(ack) => {
                debug!(
                    "Shutdown requested with {} action(s) in flight",
                    self.in_flight.len()
                );
                self.commands.close();
                self.shutdown_ack = Some(ack);
            }
        }
    }

    /// Report a rejected invocation: error text, then its failure outcome.
    fn reject(&self, action: ActionKind, error: Error) {
        warn!("{} rejected: {}", action, error);
        self.observer.on_error(&error.to_string());
        self.observer.on_action(ActionOutcome::failure(action));
    }

    /// Shared admission check; returns the invocation id when accepted.
    fn admit(&mut self, action: ActionKind, requires: Option<AppRole>) -> Option<Uuid> {
        if self.in_flight.contains_key(&action) {
            self.reject(action, Error::ActionInProgress(action));
            return None;
        }
        if let Some(role) = requires {
            if !self.readiness.is_ready(role) {
                let name = self.client(role).name().to_string();
                self.reject(
                    action,
                    Error::PreconditionViolation(format!("{} ({}) not ready", role, name)),
                );
                return None;
            }
        }
        let invocation = Uuid::new_v4();
        self.in_flight.insert(action, invocation);
        info!("[{}] {} started", invocation, action);
        Some(invocation)
    }

    fn spawn<F>(&self, action: ActionKind, invocation: Uuid, identifier: Option<Identifier>, job: F)
    where
        F: std::future::Future<Output = std::result::Result<(), Failure>> + Send + 'static,
    {
        let epoch = self.epoch;
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = job.await;
            let _ = completions.send(Completion {
                action,
                invocation,
                epoch,
                identifier,
                result,
            });
        });
    }

    fn start_login(&mut self, role: AppRole) {
        let (action, requires) = match role {
            AppRole::Primary => (ActionKind::PrimaryLogin, None),
            AppRole::Secondary => (ActionKind::SecondaryLogin, Some(AppRole::Primary)),
        };
        let Some(invocation) = self.admit(action, requires) else {
            return;
        };
        let client = Arc::clone(self.client(role));
        self.observer
            .on_status(&format!("Opening {}...", client.name()));

        self.spawn(action, invocation, None, async move {
            blocking(move || {
                client.launch()?;
                client.login()
            })
            .await
            .map_err(Failure::at(role))
        });
    }

    fn start_submit(&mut self, value: String) {
        let action = ActionKind::Submit;
        if self.in_flight.contains_key(&action) {
            self.reject(action, Error::ActionInProgress(action));
            return;
        }
        // snapshot once; a login finishing later does not retro-admit this call
        if !self.readiness.both() {
            self.reject(
                action,
                Error::PreconditionViolation(format!(
                    "{} and {} must both be logged in",
                    self.primary.name(),
                    self.secondary.name()
                )),
            );
            return;
        }
        let identifier = match Identifier::parse(&value) {
            Ok(identifier) => identifier,
            Err(e) => {
                self.reject(action, e);
                return;
            }
        };
        let Some(invocation) = self.admit(action, None) else {
            return;
        };
        self.observer.on_status(&format!(
            "Sending {} to {} and {}...",
            identifier,
            self.primary.name(),
            self.secondary.name()
        ));

        let primary = Arc::clone(&self.primary);
        let secondary = Arc::clone(&self.secondary);
        let settle = self.settle_delay;
        let value = identifier.as_str().to_string();
        self.spawn(action, invocation, Some(identifier), async move {
            let first = value.clone();
            blocking(move || primary.enter_identifier(&first))
                .await
                .map_err(Failure::at(AppRole::Primary))?;
            tokio::time::sleep(settle).await;
            blocking(move || secondary.enter_identifier(&value))
                .await
                .map_err(Failure::at(AppRole::Secondary))
        });
    }

    fn start_finish(&mut self) {
        let action = ActionKind::PrimaryFinish;
        let Some(invocation) = self.admit(action, Some(AppRole::Primary)) else {
            return;
        };
        let client = Arc::clone(&self.primary);
        self.observer
            .on_status(&format!("Minimizing {}...", client.name()));

        self.spawn(action, invocation, None, async move {
            blocking(move || client.minimize())
                .await
                .map_err(Failure::at(AppRole::Primary))
        });
    }

    fn reset(&mut self) {
        self.epoch += 1;
        self.readiness = Readiness::default();
        info!(
            "Workflow reset (epoch {}, {} action(s) still running)",
            self.epoch,
            self.in_flight.len()
        );
        self.observer.on_readiness(self.readiness);
        self.observer.on_status("Workflow reset");
        self.observer
            .on_action(ActionOutcome::success(ActionKind::Reset));
    }

    fn complete(&mut self, done: Completion) {
        let Completion {
            action,
            invocation,
            epoch,
            identifier,
            result,
        } = done;
        self.in_flight.remove(&action);

        if let Err(Failure { role, error }) = result {
            let message = format!(
                "{} failed ({}): {}",
                describe(action),
                self.client(role).name(),
                error
            );
            error!("[{}] {}", invocation, message);
            self.observer.on_error(&message);
            self.observer.on_action(ActionOutcome::failure(action));
            return;
        }

        let role = match action {
            ActionKind::PrimaryLogin => Some(AppRole::Primary),
            ActionKind::SecondaryLogin => Some(AppRole::Secondary),
            _ => None,
        };
        if let Some(role) = role {
            if epoch != self.epoch {
                warn!("[{}] {} finished after a reset", invocation, action);
                self.observer
                    .on_error(&Error::Superseded(action).to_string());
                self.observer.on_action(ActionOutcome::failure(action));
                return;
            }
            match role {
                AppRole::Primary => self.readiness.primary_ready = true,
                AppRole::Secondary => self.readiness.secondary_ready = true,
            }
            let name = self.client(role).name().to_string();
            info!("[{}] {} ready", invocation, name);
            self.observer.on_readiness(self.readiness);
            self.observer.on_status(&format!("{} ready", name));
            self.observer.on_action(ActionOutcome::success(action));
            return;
        }

        let status = match (action, identifier) {
            (ActionKind::Submit, Some(identifier)) => format!(
                "{} sent to {} and {}",
                identifier,
                self.primary.name(),
                self.secondary.name()
            ),
            _ => format!("{} minimized", self.primary.name()),
        };
        info!("[{}] {} succeeded", invocation, action);
        self.observer.on_status(&status);
        self.observer.on_action(ActionOutcome::success(action));
    }
}

fn describe(action: ActionKind) -> &'static str {
    match action {
        ActionKind::PrimaryLogin => "Primary login",
        ActionKind::SecondaryLogin => "Secondary login",
        ActionKind::Submit => "Submit",
        ActionKind::Reset => "Reset",
        ActionKind::PrimaryFinish => "Finishing primary",
    }
}

/// Run blocking automation on the blocking pool.
async fn blocking<F>(job: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| Error::Other(format!("automation worker failed: {}", e)))?
}
