//! Synthetic input backends.
//!
//! A backend knows how to bring a window to the foreground and inject
//! keystrokes into it on one desktop family. Backends shell out to a helper
//! program that already exists on the target machine.

use std::process::Command;
use std::sync::Arc;

use apm_relay_core::{Error, Key, Platform, Result};

pub mod sendkeys;
pub mod xdotool;

pub use sendkeys::SendKeysBackend;
pub use xdotool::XdotoolBackend;

/// Platform-agnostic synthetic input interface.
pub trait InputBackend: Send + Sync {
    /// Human-readable backend name for logging.
    fn name(&self) -> &'static str;

    /// Whether the helper program is installed.
    fn is_available(&self) -> bool;

    /// Higher values win when several backends are available.
    fn priority(&self) -> u8;

    /// Bring the first window whose title matches to the foreground.
    ///
    /// Returns `Ok(false)` when no such window exists.
    fn focus_window(&self, title: &str) -> Result<bool>;

    /// Minimize the first window whose title matches.
    ///
    /// Returns `Ok(false)` when no such window exists.
    fn minimize_window(&self, title: &str) -> Result<bool>;

    /// Type literal text into the focused window.
    fn type_text(&self, text: &str) -> Result<()>;

    /// Press one key or chord in the focused window.
    fn press(&self, key: &Key) -> Result<()>;
}

/// Check if a command exists in PATH.
pub(crate) fn command_exists(cmd: &str) -> bool {
    let finder = if cfg!(windows) { "where" } else { "which" };
    Command::new(finder)
        .arg(cmd)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Run a helper and report whether it exited successfully.
pub(crate) fn run_status(program: &str, args: &[&str]) -> Result<bool> {
    let output = Command::new(program).args(args).output()?;
    Ok(output.status.success())
}

/// Run a helper that must succeed.
pub(crate) fn run_checked(program: &str, args: &[&str]) -> Result<()> {
    let output = Command::new(program).args(args).output()?;
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(Error::Other(format!(
        "{program} exited with {}: {}",
        output.status,
        stderr.trim()
    )))
}

/// Registry for selecting an input backend.
pub struct BackendRegistry {
    backends: Vec<Arc<dyn InputBackend>>,
    platform: Platform,
}

impl BackendRegistry {
    /// Create a registry for the given platform.
    pub fn for_platform(platform: Platform) -> Self {
        let mut backends: Vec<Arc<dyn InputBackend>> = Vec::new();
        if platform.has_windows_desktop() {
            backends.push(Arc::new(SendKeysBackend::new()));
        }
        if platform.has_x11_desktop() {
            backends.push(Arc::new(XdotoolBackend::new()));
        }
        Self { backends, platform }
    }

    /// Create a registry for the detected platform.
    pub fn new() -> Self {
        Self::for_platform(Platform::detect())
    }

    /// Names of the backends known on this platform.
    pub fn known(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Find the highest-priority available backend.
    pub fn find_best(&self) -> Option<Arc<dyn InputBackend>> {
        self.backends
            .iter()
            .filter(|b| b.is_available())
            .max_by_key(|b| b.priority())
            .cloned()
    }

    /// Find a backend by name, regardless of availability.
    pub fn find_by_name(&self, name: &str) -> Option<Arc<dyn InputBackend>> {
        self.backends
            .iter()
            .find(|b| b.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Best backend, or `CapabilityUnavailable` naming the platform.
    pub fn require_best(&self) -> Result<Arc<dyn InputBackend>> {
        self.find_best().ok_or_else(|| {
            Error::CapabilityUnavailable(format!(
                "no synthetic input backend available on {} (known: {})",
                self.platform,
                if self.backends.is_empty() {
                    "none".to_string()
                } else {
                    self.known().join(", ")
                }
            ))
        })
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
