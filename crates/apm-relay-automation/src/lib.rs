//! # apm-relay-automation
//!
//! Drives the external desktop applications for apm-relay.
//!
//! This crate provides:
//! - The [`AutomationClient`] capability the session controller calls
//! - Synthetic input backends (xdotool on X11, SendKeys through PowerShell)
//! - Process launching with launch delays
//! - A scripted client that logs in and enters identifiers from settings
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends only on apm-relay-core.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod client;
pub mod launcher;
pub mod network;
pub mod scripted;

// Re-export commonly used types
pub use backend::{BackendRegistry, InputBackend};
pub use client::AutomationClient;
pub use launcher::launch_application;
pub use network::{ensure_connection, NetworkProbe};
pub use scripted::{LoginStep, ScriptedClient};
