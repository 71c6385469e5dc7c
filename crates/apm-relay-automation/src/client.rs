//! Capability interface for one driven application.

use apm_relay_core::Result;

/// Blocking operations against one external application.
///
/// Implementations report failures with [`apm_relay_core::Error::LaunchFailed`],
/// [`apm_relay_core::Error::LoginFailed`] or
/// [`apm_relay_core::Error::InputFailed`]; callers run them off the observer's
/// thread and never retry on their own.
pub trait AutomationClient: Send + Sync {
    /// Display name of the application.
    fn name(&self) -> &str;

    /// Start the application, or attach to an already running instance.
    fn launch(&self) -> Result<()>;

    /// Type the credentials and submit the login form.
    fn login(&self) -> Result<()>;

    /// Type `value` followed by a submission keystroke.
    fn enter_identifier(&self, value: &str) -> Result<()>;

    /// Minimize the application's main window.
    fn minimize(&self) -> Result<()>;
}
