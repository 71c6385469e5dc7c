//! X11 input through the `xdotool` command.

use apm_relay_core::{Key, Result};
use tracing::debug;

use super::{command_exists, run_checked, run_status, InputBackend};

/// Delay between typed characters, in milliseconds.
const TYPE_DELAY_MS: &str = "50";

/// Drives X11 windows with `xdotool`.
#[derive(Debug, Clone, Default)]
pub struct XdotoolBackend;

impl XdotoolBackend {
    /// Create the backend.
    pub fn new() -> Self {
        Self
    }

    /// `xdotool search` treats the name as a regex; match the title literally.
    fn title_pattern(title: &str) -> String {
        regex::escape(title)
    }
}

impl InputBackend for XdotoolBackend {
    fn name(&self) -> &'static str {
        "xdotool"
    }

    fn is_available(&self) -> bool {
        command_exists("xdotool")
    }

    fn priority(&self) -> u8 {
        50
    }

    fn focus_window(&self, title: &str) -> Result<bool> {
        let pattern = Self::title_pattern(title);
        debug!("xdotool: activating window matching '{}'", title);
        run_status(
            "xdotool",
            &[
                "search",
                "--limit",
                "1",
                "--name",
                &pattern,
                "windowactivate",
                "--sync",
            ],
        )
    }

    fn minimize_window(&self, title: &str) -> Result<bool> {
        let pattern = Self::title_pattern(title);
        debug!("xdotool: minimizing window matching '{}'", title);
        run_status(
            "xdotool",
            &[
                "search",
                "--limit",
                "1",
                "--name",
                &pattern,
                "windowminimize",
            ],
        )
    }

    fn type_text(&self, text: &str) -> Result<()> {
        run_checked("xdotool", &["type", "--delay", TYPE_DELAY_MS, "--", text])
    }

    fn press(&self, key: &Key) -> Result<()> {
        let chord = key.to_xdotool();
        run_checked("xdotool", &["key", "--", &chord])
    }
}
