//! Command-line options.

use std::path::PathBuf;

use anyhow::{bail, Result};

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "apm-relay.yaml";

/// Usage text for `--help`.
pub const USAGE: &str = "\
Usage: apm-relay [OPTIONS]

Options:
  -c, --config <PATH>  Settings file (default: apm-relay.yaml; missing file uses defaults)
      --print-schema   Print the settings JSON schema and exit
      --json           Print events as JSON lines instead of text
  -h, --help           Show this help";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    /// Settings file path
    pub config: PathBuf,
    /// Print the schema and exit
    pub print_schema: bool,
    /// JSON-lines console output
    pub json: bool,
    /// Print usage and exit
    pub help: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG),
            print_schema: false,
            json: false,
            help: false,
        }
    }
}

impl CliOptions {
    /// Parse arguments, program name excluded.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-c" | "--config" => match args.next() {
                    Some(path) => options.config = PathBuf::from(path),
                    None => bail!("{} requires a path", arg),
                },
                "--print-schema" => options.print_schema = true,
                "--json" => options.json = true,
                "-h" | "--help" => options.help = true,
                other => match other.strip_prefix("--config=") {
                    Some(path) => options.config = PathBuf::from(path),
                    None => bail!("unknown argument '{}'\n\n{}", other, USAGE),
                },
            }
        }
        Ok(options)
    }
}
