//! Hotkey listener public API
//!
//! Runs the X11 backend on a dedicated thread. The thread owns every grab it
//! makes; stopping the listener joins the thread, which releases them.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::config::HotkeyBinding;
use crate::input::backend::Registrations;
use crate::input::x11_backend::{self, X11Backend};

/// Outcome of registering the configured hotkeys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationSummary {
    pub registered: usize,
    pub failed: usize,
}

/// Handle to the listener thread; dropping it stops the thread
pub struct ListenerHandle {
    thread: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl ListenerHandle {
    /// Stop listening and wait until all hotkeys are released
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("X11 hotkey listener thread panicked");
            }
            info!("Hotkey listener stopped");
        }
    }
}

/// Spawn the X11 listener for `bindings`
///
/// The returned receiver resolves once registration has finished, with an
/// error if the display could not be reached.
pub fn spawn_listener(
    bindings: Vec<HotkeyBinding>,
    sender: Sender<HotkeyBinding>,
) -> Result<(ListenerHandle, oneshot::Receiver<Result<RegistrationSummary>>)> {
    let stop = Arc::new(AtomicBool::new(false));
    let (ready_tx, ready_rx) = oneshot::channel();

    info!(hotkey_count = bindings.len(), "Starting X11 hotkey listener");

    let thread_stop = stop.clone();
    let thread = thread::Builder::new()
        .name("x11-hotkeys".to_string())
        .spawn(move || {
            let backend = match X11Backend::connect() {
                Ok(backend) => backend,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            let registrations = Registrations::acquire(backend, &bindings);
            let summary = RegistrationSummary {
                registered: registrations.registered().len(),
                failed: registrations.failures().len(),
            };

            if ready_tx.send(Ok(summary)).is_err() || summary.registered == 0 {
                return;
            }

            if let Err(e) = x11_backend::run_event_loop(&registrations, &sender, &thread_stop) {
                error!(error = %e, "X11 hotkey listener error");
            }
        })
        .context("Failed to spawn X11 listener thread")?;

    Ok((
        ListenerHandle {
            thread: Some(thread),
            stop,
        },
        ready_rx,
    ))
}
