//! Hotkey backend abstraction layer
//!
//! A backend claims individual key combinations from the OS. [`Registrations`]
//! owns a backend together with everything it managed to claim and gives the
//! claims back when dropped, so no global grab outlives the listener.

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::HotkeyBinding;
use crate::error::LauncherError;

/// OS facility able to claim global hotkeys
pub trait HotkeyBackend {
    /// Get human-readable backend name
    fn name(&self) -> &'static str;

    /// Claim a single key combination system-wide
    fn register(&mut self, binding: &HotkeyBinding) -> Result<(), LauncherError>;

    /// Give back a previously claimed combination
    fn unregister(&mut self, binding: &HotkeyBinding) -> Result<()>;

    /// Push any buffered requests to the OS
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Scoped set of hotkey registrations, released on drop
pub struct Registrations<B: HotkeyBackend> {
    backend: B,
    registered: Vec<HotkeyBinding>,
    failures: Vec<LauncherError>,
}

impl<B: HotkeyBackend> Registrations<B> {
    /// Register every binding, tolerating individual failures
    pub fn acquire<'a>(
        mut backend: B,
        bindings: impl IntoIterator<Item = &'a HotkeyBinding>,
    ) -> Self {
        let mut registered = Vec::new();
        let mut failures = Vec::new();

        for binding in bindings {
            match backend.register(binding) {
                Ok(()) => {
                    info!(binding = %binding, backend = backend.name(), "Registered hotkey");
                    registered.push(*binding);
                }
                Err(e) => {
                    error!(binding = %binding, error = %e, "Failed to register hotkey");
                    failures.push(e);
                }
            }
        }

        if let Err(e) = backend.flush() {
            warn!(error = %e, "Failed to flush hotkey registrations");
        }

        info!(
            registered = registered.len(),
            failed = failures.len(),
            backend = backend.name(),
            "Hotkey registration finished"
        );

        Self {
            backend,
            registered,
            failures,
        }
    }

    pub fn registered(&self) -> &[HotkeyBinding] {
        &self.registered
    }

    pub fn failures(&self) -> &[LauncherError] {
        &self.failures
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Unregister everything still held; safe to call more than once
    pub fn release(&mut self) {
        if self.registered.is_empty() {
            return;
        }

        for binding in self.registered.drain(..) {
            if let Err(e) = self.backend.unregister(&binding) {
                warn!(binding = %binding, error = %e, "Failed to release hotkey");
            }
        }

        if let Err(e) = self.backend.flush() {
            warn!(error = %e, "Failed to flush hotkey release");
        }

        info!(backend = self.backend.name(), "Released all hotkeys");
    }
}

impl<B: HotkeyBackend> Drop for Registrations<B> {
    fn drop(&mut self) {
        self.release();
    }
}
