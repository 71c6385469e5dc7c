//! Operator commands read from the console.

use std::str::FromStr;

use apm_relay_core::Error;

/// Help text listing the commands.
pub const COMMAND_HELP: &str = "\
Commands:
  primary          open and log into the primary application
  secondary        open and log into the secondary application
  submit [NUMBER]  send NUMBER (or the last scanned value) to both
  scan             read a barcode from the camera
  cancel           stop a running scan
  finish           minimize the primary application
  reset            start over
  status           show which applications are ready
  help             show this list
  quit             exit";

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Log into the primary application
    Primary,
    /// Log into the secondary application
    Secondary,
    /// Submit an identifier, or the last scanned one
    Submit(Option<String>),
    /// Start a scan
    Scan,
    /// Cancel the running scan
    Cancel,
    /// Minimize the primary application
    Finish,
    /// Reset the workflow
    Reset,
    /// Print readiness
    Status,
    /// Print the command list
    Help,
    /// Exit
    Quit,
}

impl FromStr for OperatorCommand {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or("").to_ascii_lowercase();
        let argument = words.next().map(str::to_string);
        if words.next().is_some() {
            return Err(Error::Other(format!("too many arguments: '{}'", line.trim())));
        }

        let command = match (verb.as_str(), argument) {
            ("primary" | "p", None) => OperatorCommand::Primary,
            ("secondary" | "s", None) => OperatorCommand::Secondary,
            ("submit", value) => OperatorCommand::Submit(value),
            ("scan", None) => OperatorCommand::Scan,
            ("cancel" | "q", None) => OperatorCommand::Cancel,
            ("finish", None) => OperatorCommand::Finish,
            ("reset", None) => OperatorCommand::Reset,
            ("status", None) => OperatorCommand::Status,
            ("help" | "?", None) => OperatorCommand::Help,
            ("quit" | "exit", None) => OperatorCommand::Quit,
            ("", _) => return Err(Error::Other("empty command".to_string())),
            (verb, Some(_)) if KNOWN.contains(&verb) => {
                return Err(Error::Other(format!("'{}' takes no argument", verb)))
            }
            (verb, _) => {
                return Err(Error::Other(format!(
                    "unknown command '{}' (type 'help')",
                    verb
                )))
            }
        };
        Ok(command)
    }
}

const KNOWN: &[&str] = &[
    "primary", "p", "secondary", "s", "scan", "cancel", "q", "finish", "reset", "status", "help",
    "?", "quit", "exit",
];
