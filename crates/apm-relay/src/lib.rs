//! apm-relay library
//!
//! Operator-facing pieces of the relay: command-line options, the console
//! observer, operator commands and the loop that ties them to the session
//! controller and scanner. The binary entry point is in main.rs.

pub mod cli;
pub mod commands;
pub mod console;
pub mod relay;
pub mod schema;

// Re-export commonly used types
pub use cli::CliOptions;
pub use commands::OperatorCommand;
pub use console::ConsoleObserver;
pub use relay::Relay;
pub use schema::settings_schema;
