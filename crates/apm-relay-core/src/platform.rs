//! Platform detection for choosing a synthetic-input backend.

use serde::{Deserialize, Serialize};

/// Platforms the relay knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Native Linux (not WSL)
    Linux,
    /// macOS
    MacOS,
    /// Native Windows
    Windows,
    /// Windows Subsystem for Linux
    WSL,
}

impl Platform {
    /// Detect the current platform at runtime.
    ///
    /// On Linux, WSL is recognised through `/proc/version` or the
    /// `WSLInterop` binfmt entry, because desktop windows there belong to the
    /// Windows host rather than an X server.
    pub fn detect() -> Self {
        #[cfg(target_os = "linux")]
        {
            if Self::is_wsl() {
                return Platform::WSL;
            }
            Platform::Linux
        }

        #[cfg(target_os = "macos")]
        {
            Platform::MacOS
        }

        #[cfg(target_os = "windows")]
        {
            Platform::Windows
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            compile_error!("Unsupported platform - only Linux, macOS, and Windows are supported")
        }
    }

    #[cfg(target_os = "linux")]
    fn is_wsl() -> bool {
        if let Ok(version) = std::fs::read_to_string("/proc/version") {
            if version.to_lowercase().contains("microsoft") {
                return true;
            }
        }
        std::path::Path::new("/proc/sys/fs/binfmt_misc/WSLInterop").exists()
    }

    /// Get the platform name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::MacOS => "macOS",
            Platform::Windows => "Windows",
            Platform::WSL => "WSL",
        }
    }

    /// Desktop windows are Windows windows, reachable through PowerShell.
    pub fn has_windows_desktop(&self) -> bool {
        matches!(self, Platform::Windows | Platform::WSL)
    }

    /// Desktop windows may live on an X11 server.
    pub fn has_x11_desktop(&self) -> bool {
        matches!(self, Platform::Linux | Platform::WSL)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
