//! Workflow vocabulary shared by the controller, the clients and observers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Which of the two driven applications an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AppRole {
    /// Application that must be logged in first
    Primary,
    /// Application that may only be logged in once the primary is ready
    Secondary,
}

impl AppRole {
    /// Get the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppRole::Primary => "primary",
            AppRole::Secondary => "secondary",
        }
    }
}

impl std::fmt::Display for AppRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asynchronous entry points of the session controller.
///
/// Each invocation of an entry point ends in exactly one [`ActionOutcome`]
/// carrying its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Launch and log into the primary application
    PrimaryLogin,
    /// Launch and log into the secondary application
    SecondaryLogin,
    /// Push an identifier into both applications
    Submit,
    /// Clear both readiness flags
    Reset,
    /// Put the primary application away after verification
    PrimaryFinish,
}

impl ActionKind {
    /// Stable wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::PrimaryLogin => "primary_login",
            ActionKind::SecondaryLogin => "secondary_login",
            ActionKind::Submit => "submit",
            ActionKind::Reset => "reset",
            ActionKind::PrimaryFinish => "primary_finish",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal success/failure notification for one action invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActionOutcome {
    /// Action that finished
    pub action: ActionKind,
    /// Whether it succeeded
    pub succeeded: bool,
}

impl ActionOutcome {
    /// Successful outcome for `action`.
    pub fn success(action: ActionKind) -> Self {
        Self {
            action,
            succeeded: true,
        }
    }

    /// Failed outcome for `action`.
    pub fn failure(action: ActionKind) -> Self {
        Self {
            action,
            succeeded: false,
        }
    }
}

/// Snapshot of both readiness flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Readiness {
    /// Primary application logged in
    pub primary_ready: bool,
    /// Secondary application logged in
    pub secondary_ready: bool,
}

impl Readiness {
    /// Both applications are logged in.
    pub fn both(&self) -> bool {
        self.primary_ready && self.secondary_ready
    }

    /// Readiness flag for a role.
    pub fn is_ready(&self, role: AppRole) -> bool {
        match role {
            AppRole::Primary => self.primary_ready,
            AppRole::Secondary => self.secondary_ready,
        }
    }
}

/// Booking/membership number pushed into both applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Validate a raw identifier.
    ///
    /// Surrounding whitespace is ignored; the remaining value must be a
    /// non-empty run of ASCII digits.
    pub fn parse(raw: &str) -> Result<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(Error::InvalidIdentifier("identifier is empty".to_string()));
        }
        if !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidIdentifier(format!(
                "identifier must contain digits only: {value}"
            )));
        }
        Ok(Self(value.to_string()))
    }

    /// Get the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
