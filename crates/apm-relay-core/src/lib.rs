//! # apm-relay-core
//!
//! Core types for apm-relay.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other apm-relay crates. It provides:
//!
//! - Workflow vocabulary (AppRole, ActionKind, ActionOutcome, Readiness, Identifier)
//! - Settings for both applications, the scanner and the workflow
//! - Key types for synthetic input
//! - Platform detection
//! - Error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other apm-relay crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod key;
pub mod platform;
pub mod workflow;

// Re-export commonly used types
pub use config::{
    expand_env, ApplicationSettings, LoggingSettings, LoginStyle, ScannerSettings, Settings,
    WorkflowSettings,
};
pub use error::{Error, ErrorKind, Result};
pub use key::Key;
pub use platform::Platform;
pub use workflow::{ActionKind, ActionOutcome, AppRole, Identifier, Readiness};
