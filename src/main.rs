// Entry point for the tether client.
//
// Resolves configuration, wires the bridge client and built-in commands into
// a session manager, and runs it until a signal arrives or the reconnect
// budget is spent.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tether::commands::builtin_registry;
use tether::{BotConfig, BridgeClient, Cli, RunOutcome, SessionManager, ShutdownHandle};

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(outcome) => {
            log::info!("Exiting: {outcome:?}");
            outcome.into()
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<RunOutcome> {
    let config = BotConfig::load(&cli).context("Error loading config")?;

    init_logging(&config.log_level);
    log::info!("Starting tether {}", tether::VERSION);
    log::info!("Configuration: {}", config.summary());

    let registry = Arc::new(builtin_registry().context("Failed to register commands")?);

    let client = BridgeClient::new(config.bridge_addr.clone());
    let manager = SessionManager::new(client, config.manager_config(), registry);
    spawn_signal_listener(manager.shutdown_handle());

    Ok(manager.run().await)
}

/// `RUST_LOG` wins over the configured level
fn init_logging(level: &str) {
    env_logger::Builder::new()
        .parse_filters(level)
        .parse_env("RUST_LOG")
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}]: {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

fn spawn_signal_listener(shutdown: ShutdownHandle) {
    tokio::spawn(async move {
        wait_for_signal().await;
        log::info!("Received shutdown signal");
        shutdown.shutdown();
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            log::warn!("Failed to install SIGTERM handler: {e}");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
