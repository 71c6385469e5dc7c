//! Settings-driven automation client.
//!
//! [`ScriptedClient`] turns an [`ApplicationSettings`] block into the
//! launch/login/identifier keystroke sequences and plays them through an
//! [`InputBackend`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use apm_relay_core::{ApplicationSettings, Error, Key, LoginStyle, Result};
use tracing::{debug, info, warn};

use crate::backend::InputBackend;
use crate::client::AutomationClient;
use crate::launcher::launch_application;
use crate::network::NetworkProbe;

/// Shift+Tab presses that walk focus back to the username field.
const CLEAR_FIELDS_BACK_TABS: usize = 3;

/// One step of a keystroke script.
#[derive(Clone, PartialEq, Eq)]
pub enum LoginStep {
    /// Type literal text
    Type(String),
    /// Press a key or chord
    Press(Key),
    /// Wait
    Pause(Duration),
}

impl std::fmt::Debug for LoginStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginStep::Type(text) => write!(f, "Type(<{} chars>)", text.chars().count()),
            LoginStep::Press(key) => write!(f, "Press({key})"),
            LoginStep::Pause(d) => write!(f, "Pause({d:?})"),
        }
    }
}

/// Automation client for one application configured through settings.
pub struct ScriptedClient {
    settings: ApplicationSettings,
    backend: Arc<dyn InputBackend>,
    submit_key: Key,
    network: Option<NetworkProbe>,
}

impl ScriptedClient {
    /// Create a client; fails when the configured submit key does not parse.
    pub fn new(settings: ApplicationSettings, backend: Arc<dyn InputBackend>) -> Result<Self> {
        let submit_key = settings.submit_key()?;
        Ok(Self {
            settings,
            backend,
            submit_key,
            network: None,
        })
    }

    /// Probe connectivity before launching when the settings ask for it.
    pub fn with_network_probe(mut self, probe: NetworkProbe) -> Self {
        if self.settings.require_network {
            self.network = Some(probe);
        }
        self
    }

    /// Settings this client was built from.
    pub fn settings(&self) -> &ApplicationSettings {
        &self.settings
    }

    /// Keystroke script for the login form.
    pub fn login_script(&self) -> Vec<LoginStep> {
        let username = LoginStep::Type(self.settings.username.clone());
        let password = LoginStep::Type(self.settings.password.clone());
        let mut steps = Vec::new();

        match self.settings.login_style {
            LoginStyle::Direct => {
                steps.push(username);
                steps.push(LoginStep::Press(Key::Tab));
                steps.push(password);
                steps.push(LoginStep::Press(Key::Tab));
            }
            LoginStyle::ClearFields => {
                for _ in 0..CLEAR_FIELDS_BACK_TABS {
                    steps.push(LoginStep::Press(Key::Shift(Box::new(Key::Tab))));
                    steps.push(LoginStep::Pause(Duration::from_millis(50)));
                }
                steps.push(LoginStep::Press(Key::Ctrl('a')));
                steps.push(username);
                steps.push(LoginStep::Press(Key::Tab));
                steps.push(LoginStep::Press(Key::Ctrl('a')));
                steps.push(password);
                steps.push(LoginStep::Press(Key::Tab));
            }
        }

        steps.push(LoginStep::Press(self.submit_key.clone()));
        steps.push(LoginStep::Pause(self.settings.post_submit_delay()));
        steps
    }

    /// Keystroke script for entering an identifier.
    pub fn identifier_script(&self, value: &str) -> Vec<LoginStep> {
        vec![
            LoginStep::Type(value.to_string()),
            LoginStep::Press(Key::Enter),
            LoginStep::Pause(self.settings.post_input_delay()),
        ]
    }

    fn play(&self, steps: &[LoginStep]) -> Result<()> {
        for step in steps {
            match step {
                LoginStep::Type(text) => self.backend.type_text(text)?,
                LoginStep::Press(key) => self.backend.press(key)?,
                LoginStep::Pause(d) if !d.is_zero() => std::thread::sleep(*d),
                LoginStep::Pause(_) => {}
            }
        }
        Ok(())
    }

    /// Keep trying to focus the window until the focus timeout passes.
    fn wait_for_window(&self) -> Result<bool> {
        let title = &self.settings.window_title;
        let deadline = Instant::now() + self.settings.focus_timeout();
        loop {
            if self.backend.focus_window(title)? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            std::thread::sleep(self.settings.focus_poll());
        }
    }

    fn require_window(&self) -> Result<()> {
        if self.wait_for_window()? {
            Ok(())
        } else {
            Err(Error::WindowNotFound(self.settings.window_title.clone()))
        }
    }
}

impl AutomationClient for ScriptedClient {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn launch(&self) -> Result<()> {
        let app = self.name();

        if let Some(probe) = &self.network {
            probe.check().map_err(|e| Error::launch(app, e))?;
        }

        match self.backend.focus_window(&self.settings.window_title) {
            Ok(true) => {
                info!("{} already running, attached to its window", app);
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => warn!("{}: window lookup failed before launch: {}", app, e),
        }

        let path = self.settings.resolved_path();
        let working_dir = self.settings.resolved_working_dir();
        launch_application(
            app,
            &path,
            working_dir.as_deref(),
            self.settings.launch_delay(),
        )?;

        match self.wait_for_window() {
            Ok(true) => debug!("{} window focused after launch", app),
            Ok(false) => warn!(
                "{} started but window '{}' did not appear yet",
                app, self.settings.window_title
            ),
            Err(e) => warn!("{}: focusing after launch failed: {}", app, e),
        }
        Ok(())
    }

    fn login(&self) -> Result<()> {
        let app = self.name();
        self.require_window().map_err(|e| Error::login(app, e))?;

        let steps = self.login_script();
        debug!("{}: playing login script ({} steps)", app, steps.len());
        self.play(&steps).map_err(|e| Error::login(app, e))?;
        info!("{}: login submitted", app);
        Ok(())
    }

    fn enter_identifier(&self, value: &str) -> Result<()> {
        let app = self.name();
        self.require_window().map_err(|e| Error::input(app, e))?;
        self.play(&self.identifier_script(value))
            .map_err(|e| Error::input(app, e))?;
        info!("{}: identifier entered", app);
        Ok(())
    }

    fn minimize(&self) -> Result<()> {
        let title = &self.settings.window_title;
        match self.backend.minimize_window(title) {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::WindowNotFound(title.clone())),
            Err(e) => Err(Error::input(self.name(), e)),
        }
    }
}
