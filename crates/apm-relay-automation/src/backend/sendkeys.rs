//! Windows input through PowerShell and `WScript.Shell`.
//!
//! Works from native Windows and from WSL, where `powershell.exe` is reachable
//! through interop.

use apm_relay_core::key::escape_sendkeys_char;
use apm_relay_core::{Key, Result};
use tracing::debug;

use super::{command_exists, run_checked, run_status, InputBackend};

const POWERSHELL: &str = "powershell.exe";

/// Drives Windows desktop windows with `WScript.Shell.SendKeys`.
#[derive(Debug, Clone, Default)]
pub struct SendKeysBackend;

impl SendKeysBackend {
    /// Create the backend.
    pub fn new() -> Self {
        Self
    }

    /// Quote a value as a single-quoted PowerShell string.
    fn quote(value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Escape literal text for `SendKeys`.
    fn escape_text(text: &str) -> String {
        text.chars().map(escape_sendkeys_char).collect()
    }

    fn activate_script(title: &str, then: &str) -> String {
        format!(
            "$w = New-Object -ComObject WScript.Shell; \
             if ($w.AppActivate({})) {{ {then} exit 0 }} else {{ exit 1 }}",
            Self::quote(title)
        )
    }

    fn send_script(keys: &str) -> String {
        format!(
            "$w = New-Object -ComObject WScript.Shell; $w.SendKeys({})",
            Self::quote(keys)
        )
    }

    fn args(script: &str) -> [&str; 4] {
        ["-NoProfile", "-NonInteractive", "-Command", script]
    }
}

impl InputBackend for SendKeysBackend {
    fn name(&self) -> &'static str {
        "sendkeys"
    }

    fn is_available(&self) -> bool {
        command_exists(POWERSHELL)
    }

    fn priority(&self) -> u8 {
        100
    }

    fn focus_window(&self, title: &str) -> Result<bool> {
        debug!("sendkeys: activating window '{}'", title);
        let script = Self::activate_script(title, "");
        run_status(POWERSHELL, &Self::args(&script))
    }

    fn minimize_window(&self, title: &str) -> Result<bool> {
        debug!("sendkeys: minimizing window '{}'", title);
        // Alt+Space opens the window menu, `n` picks Minimize.
        let script = Self::activate_script(
            title,
            "Start-Sleep -Milliseconds 100; $w.SendKeys('% '); Start-Sleep -Milliseconds 100; $w.SendKeys('n');",
        );
        run_status(POWERSHELL, &Self::args(&script))
    }

    fn type_text(&self, text: &str) -> Result<()> {
        let script = Self::send_script(&Self::escape_text(text));
        run_checked(POWERSHELL, &Self::args(&script))
    }

    fn press(&self, key: &Key) -> Result<()> {
        let script = Self::send_script(&key.to_sendkeys());
        run_checked(POWERSHELL, &Self::args(&script))
    }
}
