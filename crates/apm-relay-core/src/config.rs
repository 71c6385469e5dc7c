//! Configuration types for apm-relay.
//!
//! Settings are read from a YAML file laid over built-in defaults, then
//! overridden by `<SECTION>_<OPTION>` environment variables
//! (e.g. `PRIMARY_PASSWORD`, `WORKFLOW_SETTLE_DELAY_MS`).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{AppRole, Error, Key, Result};

lazy_static! {
    static ref ENV_VAR: Regex = Regex::new(r"\$\{(\w+)\}|\$(\w+)|%(\w+)%").unwrap();
}

/// Expand `$VAR`, `${VAR}` and `%VAR%` references from the process environment.
///
/// Unknown variables are left untouched.
pub fn expand_env(input: &str) -> String {
    expand_env_with(input, |name| std::env::var(name).ok())
}

/// Expand variable references using `lookup`.
pub fn expand_env_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_VAR
        .replace_all(input, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            lookup(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Complete relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Settings {
    /// Application that is logged in first
    pub primary: ApplicationSettings,
    /// Application that is logged in second
    pub secondary: ApplicationSettings,
    /// Barcode scanner
    pub scanner: ScannerSettings,
    /// Workflow timing
    pub workflow: WorkflowSettings,
    /// Logging
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            primary: ApplicationSettings::primary_defaults(),
            secondary: ApplicationSettings::secondary_defaults(),
            scanner: ScannerSettings::default(),
            workflow: WorkflowSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings the way the binary does.
    ///
    /// A missing file is not an error; defaults are used instead. Environment
    /// overrides are applied afterwards and the result is validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut settings = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::parse_yaml(&content)?
        } else {
            Self::default()
        };
        settings.apply_env_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string and validate it.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings = Self::parse_yaml(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Lay `yaml` over the defaults without validating.
    ///
    /// Merging happens on the YAML tree so each application section keeps
    /// its own role-specific defaults for the keys it does not mention.
    fn parse_yaml(yaml: &str) -> Result<Self> {
        let mut base = serde_yaml::to_value(Self::default())
            .map_err(|e| Error::Config(format!("cannot encode defaults: {e}")))?;
        let overlay: serde_yaml::Value = if yaml.trim().is_empty() {
            serde_yaml::Value::Null
        } else {
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?
        };
        merge_yaml(&mut base, overlay);
        serde_yaml::from_value(base).map_err(|e| Error::Config(e.to_string()))
    }

    /// Settings of the application playing `role`.
    pub fn application(&self, role: AppRole) -> &ApplicationSettings {
        match role {
            AppRole::Primary => &self.primary,
            AppRole::Secondary => &self.secondary,
        }
    }

    /// Apply `<SECTION>_<OPTION>` overrides obtained from `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.primary.apply_env_overrides("PRIMARY", &lookup)?;
        self.secondary.apply_env_overrides("SECONDARY", &lookup)?;

        if let Some(v) = lookup("SCANNER_ENABLED") {
            self.scanner.enabled = parse_env("SCANNER_ENABLED", &v)?;
        }
        if let Some(v) = lookup("SCANNER_CAMERA_ID") {
            self.scanner.camera_id = parse_env("SCANNER_CAMERA_ID", &v)?;
        }
        if let Some(v) = lookup("SCANNER_SCAN_TIMEOUT_MS") {
            self.scanner.scan_timeout_ms = parse_env("SCANNER_SCAN_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("SCANNER_WINDOW_TITLE") {
            self.scanner.window_title = v;
        }
        if let Some(v) = lookup("SCANNER_FRAMES_DIR") {
            self.scanner.frames_dir = Some(PathBuf::from(v));
        }

        if let Some(v) = lookup("WORKFLOW_SETTLE_DELAY_MS") {
            self.workflow.settle_delay_ms = parse_env("WORKFLOW_SETTLE_DELAY_MS", &v)?;
        }
        if let Some(v) = lookup("WORKFLOW_NETWORK_PROBE_ADDR") {
            self.workflow.network_probe_addr = v;
        }
        if let Some(v) = lookup("WORKFLOW_NETWORK_TIMEOUT_MS") {
            self.workflow.network_timeout_ms = parse_env("WORKFLOW_NETWORK_TIMEOUT_MS", &v)?;
        }

        if let Some(v) = lookup("LOGGING_LEVEL") {
            self.logging.level = v;
        }
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        self.primary.validate("primary")?;
        self.secondary.validate("secondary")?;

        if self.scanner.enabled && self.scanner.window_title.trim().is_empty() {
            return Err(Error::Config(
                "scanner.window_title cannot be empty".to_string(),
            ));
        }

        self.workflow.network_probe_addr()?;
        Ok(())
    }
}

/// Recursively lay `overlay` over `base`; mappings merge, everything else replaces.
fn merge_yaml(base: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    use serde_yaml::Value;

    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{key}: {e}")))
}

/// How credentials are typed into an application's login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoginStyle {
    /// Focus lands on the username field; type, Tab, type, Tab, submit
    #[default]
    Direct,
    /// Walk focus back to the username field and select-all before each entry
    ClearFields,
}

impl FromStr for LoginStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(LoginStyle::Direct),
            "clear_fields" => Ok(LoginStyle::ClearFields),
            other => Err(Error::Config(format!("unknown login style: {other}"))),
        }
    }
}

/// Settings for one external application.
#[derive(Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ApplicationSettings {
    /// Display name used in status and error messages
    pub name: String,
    /// Executable path; `$VAR`/`%VAR%` references are expanded
    pub path: String,
    /// Working directory; defaults to the executable's directory
    pub working_dir: Option<String>,
    /// Title of the main window, used for focusing
    pub window_title: String,
    /// Login username
    pub username: String,
    /// Login password
    pub password: String,
    /// Key that submits the login form
    pub submit_key: String,
    /// Credential typing script
    pub login_style: LoginStyle,
    /// Wait after starting the process, in milliseconds
    pub launch_delay_ms: u64,
    /// Wait after submitting the login form, in milliseconds
    pub post_submit_delay_ms: u64,
    /// Wait after entering an identifier, in milliseconds
    pub post_input_delay_ms: u64,
    /// How long to keep trying to focus the window, in milliseconds
    pub focus_timeout_ms: u64,
    /// Interval between focus attempts, in milliseconds
    pub focus_poll_ms: u64,
    /// Probe outbound connectivity before launching
    pub require_network: bool,
}

impl std::fmt::Debug for ApplicationSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationSettings")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("working_dir", &self.working_dir)
            .field("window_title", &self.window_title)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("submit_key", &self.submit_key)
            .field("login_style", &self.login_style)
            .field("launch_delay_ms", &self.launch_delay_ms)
            .field("require_network", &self.require_network)
            .finish_non_exhaustive()
    }
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            name: "Application".to_string(),
            path: String::new(),
            working_dir: None,
            window_title: String::new(),
            username: String::new(),
            password: String::new(),
            submit_key: "Enter".to_string(),
            login_style: LoginStyle::Direct,
            launch_delay_ms: 5000,
            post_submit_delay_ms: 1000,
            post_input_delay_ms: 500,
            focus_timeout_ms: 5000,
            focus_poll_ms: 500,
            require_network: false,
        }
    }
}

impl ApplicationSettings {
    /// Defaults for the first application of the deployment (Frista).
    pub fn primary_defaults() -> Self {
        Self {
            name: "Frista".to_string(),
            path: r"D:\BPJS\Frista\Frista.exe".to_string(),
            window_title: "Frista (Face Recognition BPJS Kesehatan)".to_string(),
            submit_key: "Space".to_string(),
            launch_delay_ms: 5000,
            ..Self::default()
        }
    }

    /// Defaults for the second application of the deployment (After).
    pub fn secondary_defaults() -> Self {
        Self {
            name: "After".to_string(),
            path: r"C:\Program Files (x86)\BPJS Kesehatan\Aplikasi Sidik Jari BPJS Kesehatan\After.exe"
                .to_string(),
            window_title: "After".to_string(),
            submit_key: "Enter".to_string(),
            login_style: LoginStyle::ClearFields,
            launch_delay_ms: 7000,
            ..Self::default()
        }
    }

    /// Parsed submit key.
    pub fn submit_key(&self) -> Result<Key> {
        Key::parse(&self.submit_key)
    }

    /// Executable path with environment references expanded.
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(expand_env(&self.path))
    }

    /// Working directory for the process.
    ///
    /// Uses `working_dir` when it is set and exists, otherwise the directory
    /// holding the executable.
    pub fn resolved_working_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.working_dir {
            let dir = PathBuf::from(expand_env(dir));
            if dir.is_dir() {
                return Some(dir);
            }
        }
        self.resolved_path()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }

    /// Launch delay as a duration.
    pub fn launch_delay(&self) -> Duration {
        Duration::from_millis(self.launch_delay_ms)
    }

    /// Post-login wait as a duration.
    pub fn post_submit_delay(&self) -> Duration {
        Duration::from_millis(self.post_submit_delay_ms)
    }

    /// Post-identifier wait as a duration.
    pub fn post_input_delay(&self) -> Duration {
        Duration::from_millis(self.post_input_delay_ms)
    }

    /// Focus timeout as a duration.
    pub fn focus_timeout(&self) -> Duration {
        Duration::from_millis(self.focus_timeout_ms)
    }

    /// Focus poll interval as a duration.
    pub fn focus_poll(&self) -> Duration {
        Duration::from_millis(self.focus_poll_ms.max(1))
    }

    fn apply_env_overrides<F>(&mut self, section: &str, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = |option: &str| format!("{section}_{option}");

        if let Some(v) = lookup(&key("NAME")) {
            self.name = v;
        }
        if let Some(v) = lookup(&key("PATH")) {
            self.path = v;
        }
        if let Some(v) = lookup(&key("WORKING_DIR")) {
            self.working_dir = Some(v);
        }
        if let Some(v) = lookup(&key("WINDOW_TITLE")) {
            self.window_title = v;
        }
        if let Some(v) = lookup(&key("USERNAME")) {
            self.username = v;
        }
        if let Some(v) = lookup(&key("PASSWORD")) {
            self.password = v;
        }
        if let Some(v) = lookup(&key("SUBMIT_KEY")) {
            self.submit_key = v;
        }
        if let Some(v) = lookup(&key("LOGIN_STYLE")) {
            self.login_style = v.parse()?;
        }
        let name = key("LAUNCH_DELAY_MS");
        if let Some(v) = lookup(&name) {
            self.launch_delay_ms = parse_env(&name, &v)?;
        }
        let name = key("REQUIRE_NETWORK");
        if let Some(v) = lookup(&name) {
            self.require_network = parse_env(&name, &v)?;
        }
        Ok(())
    }

    fn validate(&self, section: &str) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config(format!("{section}.name cannot be empty")));
        }
        if self.window_title.trim().is_empty() {
            return Err(Error::Config(format!(
                "{section}.window_title cannot be empty"
            )));
        }
        self.submit_key()
            .map_err(|e| Error::Config(format!("{section}.submit_key: {e}")))?;
        Ok(())
    }
}

/// Barcode scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScannerSettings {
    /// Offer the scan step at all
    pub enabled: bool,
    /// Camera device index
    pub camera_id: u32,
    /// Scan deadline in milliseconds; values below one second are raised to it
    pub scan_timeout_ms: u64,
    /// Label of the live preview
    pub window_title: String,
    /// Replay frames from this directory instead of a live camera
    pub frames_dir: Option<PathBuf>,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            camera_id: 0,
            scan_timeout_ms: 15_000,
            window_title: "Barcode Scanner".to_string(),
            frames_dir: None,
        }
    }
}

impl ScannerSettings {
    /// Scan deadline as configured, before coercion.
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }
}

/// Workflow timing settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WorkflowSettings {
    /// Wait between driving the primary and the secondary application
    pub settle_delay_ms: u64,
    /// Address dialled to prove outbound connectivity
    pub network_probe_addr: String,
    /// Connect timeout for the probe, in milliseconds
    pub network_timeout_ms: u64,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1000,
            network_probe_addr: "8.8.8.8:53".to_string(),
            network_timeout_ms: 5000,
        }
    }
}

impl WorkflowSettings {
    /// Settle delay as a duration.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Probe timeout as a duration.
    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }

    /// Parsed probe address.
    pub fn network_probe_addr(&self) -> Result<SocketAddr> {
        self.network_probe_addr.parse().map_err(|e| {
            Error::Config(format!(
                "workflow.network_probe_addr '{}': {e}",
                self.network_probe_addr
            ))
        })
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is not set (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.primary.name, "Frista");
        assert_eq!(settings.primary.submit_key, "Space");
        assert_eq!(settings.primary.launch_delay_ms, 5000);
        assert_eq!(settings.secondary.name, "After");
        assert_eq!(settings.secondary.login_style, LoginStyle::ClearFields);
        assert_eq!(settings.secondary.launch_delay_ms, 7000);
        assert_eq!(settings.workflow.settle_delay_ms, 1000);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_role_defaults() {
        let yaml = r#"
primary:
  username: operator
secondary:
  username: operator2
  launch_delay_ms: 9000
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.primary.username, "operator");
        assert_eq!(settings.primary.submit_key, "Space");
        assert_eq!(settings.primary.name, "Frista");
        assert_eq!(settings.secondary.username, "operator2");
        assert_eq!(settings.secondary.launch_delay_ms, 9000);
        assert_eq!(settings.secondary.login_style, LoginStyle::ClearFields);
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
primary:
  name: Face
  path: /opt/face/face
  window_title: Face Window
  submit_key: enter
  login_style: clear_fields
scanner:
  enabled: false
  camera_id: 2
  scan_timeout_ms: 3000
workflow:
  settle_delay_ms: 250
  network_probe_addr: "1.1.1.1:443"
logging:
  level: debug
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.primary.name, "Face");
        assert_eq!(settings.primary.submit_key().unwrap(), Key::Enter);
        assert_eq!(settings.primary.login_style, LoginStyle::ClearFields);
        assert!(!settings.scanner.enabled);
        assert_eq!(settings.scanner.camera_id, 2);
        assert_eq!(settings.scanner.scan_timeout(), Duration::from_secs(3));
        assert_eq!(settings.workflow.settle_delay(), Duration::from_millis(250));
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn test_empty_yaml_is_defaults() {
        let settings = Settings::from_yaml("").unwrap();
        assert_eq!(settings.primary.name, "Frista");
    }

    #[test]
    fn test_invalid_submit_key_rejected() {
        let yaml = "primary:\n  submit_key: NotAKey\n";
        let err = Settings::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("primary.submit_key"));
    }

    #[test]
    fn test_literal_space_submit_key() {
        let yaml = "primary:\n  submit_key: \" \"\n";
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.primary.submit_key().unwrap(), Key::Space);
    }

    #[test]
    fn test_empty_window_title_rejected() {
        let mut settings = Settings::default();
        settings.secondary.window_title = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_probe_addr_rejected() {
        let mut settings = Settings::default();
        settings.workflow.network_probe_addr = "not-an-addr".to_string();
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_login_style_rejected() {
        let yaml = "secondary:\n  login_style: telepathy\n";
        assert!(Settings::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("PRIMARY_PASSWORD", "s3cret"),
            ("SECONDARY_USERNAME", "op"),
            ("SECONDARY_LOGIN_STYLE", "direct"),
            ("SCANNER_CAMERA_ID", "3"),
            ("WORKFLOW_SETTLE_DELAY_MS", "40"),
            ("LOGGING_LEVEL", "trace"),
        ]);
        let mut settings = Settings::default();
        settings
            .apply_env_overrides(|k| vars.get(k).cloned())
            .unwrap();

        assert_eq!(settings.primary.password, "s3cret");
        assert_eq!(settings.secondary.username, "op");
        assert_eq!(settings.secondary.login_style, LoginStyle::Direct);
        assert_eq!(settings.scanner.camera_id, 3);
        assert_eq!(settings.workflow.settle_delay_ms, 40);
        assert_eq!(settings.logging.level, "trace");
    }

    #[test]
    fn test_env_override_bad_number() {
        let vars = env(&[("SCANNER_CAMERA_ID", "front")]);
        let mut settings = Settings::default();
        let err = settings
            .apply_env_overrides(|k| vars.get(k).cloned())
            .unwrap_err();
        assert!(err.to_string().contains("SCANNER_CAMERA_ID"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(settings.secondary.name, "After");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.yaml");
        std::fs::write(&path, "workflow:\n  settle_delay_ms: 10\n").unwrap();
        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.workflow.settle_delay_ms, 10);
    }

    #[test]
    fn test_expand_env_forms() {
        let lookup = |name: &str| match name {
            "HOME" => Some("/home/op".to_string()),
            "ProgramFiles" => Some(r"C:\Program Files".to_string()),
            _ => None,
        };
        assert_eq!(expand_env_with("$HOME/app", lookup), "/home/op/app");
        assert_eq!(expand_env_with("${HOME}/app", lookup), "/home/op/app");
        assert_eq!(
            expand_env_with(r"%ProgramFiles%\After.exe", lookup),
            r"C:\Program Files\After.exe"
        );
        assert_eq!(expand_env_with("$MISSING/x", lookup), "$MISSING/x");
    }

    #[test]
    fn test_working_dir_falls_back_to_parent() {
        let app = ApplicationSettings {
            path: "/opt/relay/bin/app".to_string(),
            working_dir: Some("/definitely/not/here".to_string()),
            ..ApplicationSettings::default()
        };
        assert_eq!(
            app.resolved_working_dir(),
            Some(PathBuf::from("/opt/relay/bin"))
        );
    }

    #[test]
    fn test_working_dir_used_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let app = ApplicationSettings {
            path: "/opt/relay/bin/app".to_string(),
            working_dir: Some(dir.path().to_string_lossy().into_owned()),
            ..ApplicationSettings::default()
        };
        assert_eq!(app.resolved_working_dir(), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn test_debug_redacts_password() {
        let app = ApplicationSettings {
            password: "hunter2".to_string(),
            ..ApplicationSettings::default()
        };
        let debug = format!("{app:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
