//! # apm-relay
//!
//! Operator console for the two-application check-in workflow: log into the
//! primary application, then the secondary, then send one booking number to
//! both, typed or scanned from a card.
//!
//! ## Architecture
//!
//! This is Layer 3 - the binary that ties together:
//! - apm-relay-core: Settings, errors, workflow types
//! - apm-relay-automation: Input backends and scripted application clients
//! - apm-relay-scanner: Barcode scanning
//! - apm-relay-session: The workflow controller

use std::sync::Arc;

use anyhow::Context;
use apm_relay::cli::USAGE;
use apm_relay::{settings_schema, CliOptions, ConsoleObserver, Relay};
use apm_relay_automation::{BackendRegistry, NetworkProbe, ScriptedClient};
use apm_relay_core::{Platform, Settings};
use apm_relay_scanner::{CancelToken, Scanner};
use apm_relay_session::SessionController;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = CliOptions::parse(std::env::args().skip(1))?;
    if options.help {
        println!("{}", USAGE);
        return Ok(());
    }
    if options.print_schema {
        println!("{}", serde_json::to_string_pretty(&settings_schema())?);
        return Ok(());
    }

    let settings = Settings::load(&options.config)
        .with_context(|| format!("loading {}", options.config.display()))?;

    // Initialize logging on stderr; stdout is the operator console
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&settings.logging.level))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let platform = Platform::detect();
    tracing::info!(
        "apm-relay v{} starting on {} (config: {})",
        env!("CARGO_PKG_VERSION"),
        platform,
        options.config.display()
    );

    let backend = BackendRegistry::for_platform(platform)
        .require_best()
        .context("no input backend for this desktop")?;
    tracing::info!("Using input backend '{}'", backend.name());

    let probe = NetworkProbe::from_settings(&settings.workflow)?;
    let primary = ScriptedClient::new(settings.primary.clone(), Arc::clone(&backend))?
        .with_network_probe(probe);
    let secondary =
        ScriptedClient::new(settings.secondary.clone(), backend)?.with_network_probe(probe);

    let console = Arc::new(ConsoleObserver::stdout(options.json));
    let controller = SessionController::builder()
        .primary(Arc::new(primary))
        .secondary(Arc::new(secondary))
        .observer(console.clone())
        .workflow(&settings.workflow)
        .build()?;

    let cancel = CancelToken::new();
    let scanner = Scanner::from_settings(settings.scanner.clone(), cancel.clone());

    let mut relay = Relay::new(controller, Arc::new(scanner), cancel, console);
    relay.run(BufReader::new(tokio::io::stdin())).await?;

    tracing::info!("apm-relay shutting down");
    Ok(())
}
