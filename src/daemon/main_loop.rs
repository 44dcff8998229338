//! Launcher main loop: register hotkeys, dispatch presses, release on shutdown

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::dispatcher::{Dispatcher, StopReason};
use super::launcher::SystemLauncher;
use crate::config::{BindingTable, HotkeyBinding};
use crate::constants::dispatch::EVENT_CHANNEL_CAPACITY;
use crate::input::listener;

/// Run until SIGINT, SIGTERM or SIGHUP
pub async fn run_launcher(table: BindingTable, launcher: SystemLauncher) -> Result<()> {
    if table.is_empty() {
        warn!("No hotkeys configured - nothing to listen for");
        return Ok(());
    }

    let shutdown = shutdown_signal()?;

    let table = Arc::new(table);
    let bindings: Vec<HotkeyBinding> = table
        .sorted()
        .into_iter()
        .map(|(binding, _)| *binding)
        .collect();

    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (listener, ready) = listener::spawn_listener(bindings, event_tx)?;

    let summary = ready
        .await
        .context("Hotkey listener exited before finishing registration")??;

    if summary.registered == 0 {
        listener.stop();
        anyhow::bail!(
            "None of the {} configured hotkeys could be registered",
            summary.failed
        );
    }

    if summary.failed > 0 {
        warn!(
            failed = summary.failed,
            registered = summary.registered,
            "Some hotkeys could not be registered, continuing with the rest"
        );
    }

    let dispatcher = Dispatcher::new(table, launcher);
    let reason = dispatcher.run(event_rx, shutdown).await;

    listener.stop();
    exit_status(reason)
}

/// Only a shutdown signal ends the launcher cleanly
fn exit_status(reason: StopReason) -> Result<()> {
    match reason {
        StopReason::Shutdown => {
            info!("Hotkey launcher stopped");
            Ok(())
        }
        StopReason::ListenerClosed => {
            anyhow::bail!("Hotkey listener stopped unexpectedly, no hotkeys are active")
        }
    }
}

/// Resolves on the first termination signal
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;
    let mut hangup = signal(SignalKind::hangup()).context("Failed to register SIGHUP handler")?;
    let mut interrupt =
        signal(SignalKind::interrupt()).context("Failed to register SIGINT handler")?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("SIGINT received"),
            _ = terminate.recv() => info!("SIGTERM received"),
            _ = hangup.recv() => info!("SIGHUP received"),
        }
    })
}
