//! Error types for apm-relay.

use thiserror::Error;

use crate::ActionKind;

/// Main error type for apm-relay operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Application executable missing or process could not start
    #[error("Launch failed for {app}: {reason}")]
    LaunchFailed {
        /// Application display name
        app: String,
        /// Underlying cause
        reason: String,
    },

    /// Credential entry could not be driven
    #[error("Login failed for {app}: {reason}")]
    LoginFailed {
        /// Application display name
        app: String,
        /// Underlying cause
        reason: String,
    },

    /// Identifier injection failed
    #[error("Input failed for {app}: {reason}")]
    InputFailed {
        /// Application display name
        app: String,
        /// Underlying cause
        reason: String,
    },

    /// Required capability (input backend, camera, decoder) is not present
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Camera could not be opened
    #[error("Camera {0} could not be opened")]
    DeviceUnavailable(u32),

    /// Camera stopped delivering frames
    #[error("No frame received from camera")]
    NoFrame,

    /// Operator aborted the scan
    #[error("Scan cancelled by operator")]
    CancelledByOperator,

    /// Scan deadline passed without a decoded value
    #[error("Scan timed out after {0}ms")]
    Timeout(u64),

    /// Action invoked before its prerequisite stage completed
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    /// Action invoked while a previous invocation is still running
    #[error("Action already in progress: {0}")]
    ActionInProgress(ActionKind),

    /// Action finished after a reset started a new workflow
    #[error("Action superseded by reset: {0}")]
    Superseded(ActionKind),

    /// Target window could not be found or focused
    #[error("Window not found: {0}")]
    WindowNotFound(String),

    /// Outbound network connection is not available
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Identifier failed validation
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Invalid key string
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session controller is no longer running
    #[error("Session controller is closed")]
    ControllerClosed,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

/// Stable classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ErrorKind {
    LaunchFailed,
    LoginFailed,
    InputFailed,
    CapabilityUnavailable,
    DeviceUnavailable,
    NoFrame,
    CancelledByOperator,
    Timeout,
    PreconditionViolation,
    ActionInProgress,
    Superseded,
    WindowNotFound,
    NetworkUnavailable,
    InvalidIdentifier,
    InvalidKey,
    Config,
    ControllerClosed,
    Io,
    Serialization,
    Other,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::LaunchFailed { .. } => ErrorKind::LaunchFailed,
            Error::LoginFailed { .. } => ErrorKind::LoginFailed,
            Error::InputFailed { .. } => ErrorKind::InputFailed,
            Error::CapabilityUnavailable(_) => ErrorKind::CapabilityUnavailable,
            Error::DeviceUnavailable(_) => ErrorKind::DeviceUnavailable,
            Error::NoFrame => ErrorKind::NoFrame,
            Error::CancelledByOperator => ErrorKind::CancelledByOperator,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::PreconditionViolation(_) => ErrorKind::PreconditionViolation,
            Error::ActionInProgress(_) => ErrorKind::ActionInProgress,
            Error::Superseded(_) => ErrorKind::Superseded,
            Error::WindowNotFound(_) => ErrorKind::WindowNotFound,
            Error::NetworkUnavailable(_) => ErrorKind::NetworkUnavailable,
            Error::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            Error::InvalidKey(_) => ErrorKind::InvalidKey,
            Error::Config(_) => ErrorKind::Config,
            Error::ControllerClosed => ErrorKind::ControllerClosed,
            Error::Io(_) => ErrorKind::Io,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Launch failure for `app`.
    pub fn launch(app: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::LaunchFailed {
            app: app.into(),
            reason: reason.to_string(),
        }
    }

    /// Login failure for `app`.
    pub fn login(app: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::LoginFailed {
            app: app.into(),
            reason: reason.to_string(),
        }
    }

    /// Input failure for `app`.
    pub fn input(app: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::InputFailed {
            app: app.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
