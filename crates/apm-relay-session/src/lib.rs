//! # apm-relay-session
//!
//! Workflow controller for apm-relay.
//!
//! This crate provides:
//! - The session controller that sequences primary login, secondary login
//!   and identifier submission
//! - Readiness tracking with reset epochs
//! - The observer protocol (status, readiness, error, action outcome)
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on apm-relay-core and
//! drives the `AutomationClient` capability from apm-relay-automation.
//! Entry points post commands to a single consumer task that owns all
//! workflow state; blocking automation calls run on the blocking pool.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod observer;

// Re-export commonly used types
pub use controller::{SessionController, SessionControllerBuilder};
pub use observer::{ChannelObserver, NoopObserver, SessionEvent, SessionObserver};
