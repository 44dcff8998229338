//! X11 XGrabKey hotkey backend
//!
//! Uses X11's native global hotkey registration via passive key grabs on the
//! root window. No special permissions are required.
//!
//! Limitations:
//! - Only one client can grab a given combination; a second grab fails with BadAccess
//! - Under XWayland only X11 clients' focus is covered

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::Sender;
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::config::HotkeyBinding;
use crate::constants::x11::{EVDEV_KEYCODE_OFFSET, MAX_KEYCODE, MIN_KEYCODE, POLL_TIMEOUT_MS};
use crate::error::LauncherError;
use crate::input::backend::{HotkeyBackend, Registrations};

/// Lock modifiers X11 reports as part of the key state
///
/// X11 treats "Ctrl+N" and "Ctrl+N+NumLock" as different combinations, so
/// every binding is grabbed once per permutation of these.
fn ignored_lock_masks() -> [ModMask; 4] {
    [
        ModMask::from(0u16),
        ModMask::M2,
        ModMask::LOCK,
        ModMask::M2 | ModMask::LOCK,
    ]
}

pub struct X11Backend {
    conn: RustConnection,
    root: Window,
}

impl X11Backend {
    /// Connect to the display named by $DISPLAY
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) =
            x11rb::connect(None).context("Failed to connect to X11 for hotkey listening")?;
        let root = conn.setup().roots[screen_num].root;

        info!(screen = screen_num, "X11 hotkey backend connected to display");
        Ok(Self { conn, root })
    }

    pub fn connection(&self) -> &RustConnection {
        &self.conn
    }

    fn ungrab_masks(&self, keycode: Keycode, modmask: ModMask, masks: &[ModMask]) -> Result<()> {
        for ignore_mask in masks {
            self.conn
                .ungrab_key(keycode, self.root, modmask | *ignore_mask)
                .context("Failed to send UngrabKey request")?;
        }
        Ok(())
    }
}

impl HotkeyBackend for X11Backend {
    fn name(&self) -> &'static str {
        "X11"
    }

    fn register(&mut self, binding: &HotkeyBinding) -> Result<(), LauncherError> {
        let (keycode, modmask) =
            binding_to_x11_key(binding).ok_or_else(|| LauncherError::Registration {
                binding: binding.display_name(),
                reason: format!("key code {} has no X11 keycode", binding.key_code),
            })?;

        let masks = ignored_lock_masks();
        for (grabbed, ignore_mask) in masks.iter().enumerate() {
            let effective_modmask = modmask | *ignore_mask;

            // Checked so a combination already grabbed by another client
            // surfaces here as BadAccess instead of as an async error
            let outcome = self
                .conn
                .grab_key(
                    false,
                    self.root,
                    effective_modmask,
                    keycode,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                )
                .map_err(|e| e.to_string())
                .and_then(|cookie| cookie.check().map_err(|e| e.to_string()));

            if let Err(reason) = outcome {
                if let Err(e) = self.ungrab_masks(keycode, modmask, &masks[..grabbed]) {
                    warn!(binding = %binding, error = %e, "Failed to roll back partial grab");
                }
                return Err(LauncherError::Registration {
                    binding: binding.display_name(),
                    reason,
                });
            }
        }

        debug!(
            binding = %binding,
            x11_keycode = keycode,
            modmask = ?modmask,
            "Grabbed key on root window"
        );
        Ok(())
    }

    fn unregister(&mut self, binding: &HotkeyBinding) -> Result<()> {
        let (keycode, modmask) = binding_to_x11_key(binding)
            .with_context(|| format!("No X11 keycode for {}", binding))?;
        self.ungrab_masks(keycode, modmask, &ignored_lock_masks())
    }

    fn flush(&mut self) -> Result<()> {
        self.conn.flush().context("Failed to flush X11 connection")?;
        Ok(())
    }
}

/// Block on the X11 connection and forward matching key presses
///
/// Returns when `stop` is set or the receiving side of `sender` is gone.
#[allow(unsafe_code)] // Required for libc::poll() system call
pub fn run_event_loop(
    registrations: &Registrations<X11Backend>,
    sender: &Sender<HotkeyBinding>,
    stop: &Arc<AtomicBool>,
) -> Result<()> {
    let conn = registrations.backend().connection();

    let hotkey_map: HashMap<(Keycode, ModMask), HotkeyBinding> = registrations
        .registered()
        .iter()
        .filter_map(|binding| binding_to_x11_key(binding).map(|key| (key, *binding)))
        .collect();

    info!(
        registered_hotkeys = hotkey_map.len(),
        "X11 hotkeys registered, entering event loop"
    );

    let x11_fd = conn.stream().as_raw_fd();
    let mut pending: Option<Event> = None;

    while !stop.load(Ordering::Relaxed) {
        let mut poll_fds = [libc::pollfd {
            fd: x11_fd,
            events: libc::POLLIN,
            revents: 0,
        }];

        // SAFETY: `poll_fds` is a valid pointer to a stack-allocated array of `pollfd`.
        // The array length is 1, which matches the second argument.
        let poll_result = unsafe { libc::poll(poll_fds.as_mut_ptr(), 1, POLL_TIMEOUT_MS) };

        if poll_result < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err).context("poll() failed on X11 connection");
        }

        // Drain every queued event, including ones x11rb buffered while
        // reading earlier replies
        loop {
            let event = match pending.take() {
                Some(event) => event,
                None => match conn.poll_for_event().context("Failed to poll for X11 event")? {
                    Some(event) => event,
                    None => break,
                },
            };

            match event {
                Event::KeyPress(key_event) => {
                    let modmask = normalize_modmask(key_event.state);

                    match hotkey_map.get(&(key_event.detail, modmask)) {
                        Some(binding) => {
                            info!(binding = %binding, "Hotkey pressed");
                            if sender.blocking_send(*binding).is_err() {
                                info!("Dispatcher closed, stopping X11 listener");
                                return Ok(());
                            }
                        }
                        None => debug!(
                            keycode = key_event.detail,
                            modmask = ?modmask,
                            "KeyPress event didn't match any registered hotkey"
                        ),
                    }
                }
                Event::KeyRelease(release) => {
                    // Without detectable auto-repeat a held key arrives as
                    // Release/Press pairs sharing one timestamp. The server
                    // writes both in one batch, so only an already-buffered
                    // press is compared; a press arriving later counts as new.
                    if let Some(next) = conn.poll_for_event()? {
                        let repeat = match &next {
                            Event::KeyPress(press) => is_auto_repeat(&release, press),
                            _ => false,
                        };
                        if repeat {
                            debug!(keycode = release.detail, "Ignoring auto-repeat");
                            continue;
                        }
                        pending = Some(next);
                    }
                }
                Event::MappingNotify(_) => {
                    debug!("Keyboard mapping changed, grabs follow the evdev keycode layout");
                }
                Event::Error(e) => {
                    warn!(error = ?e, "X11 error on hotkey connection");
                }
                _ => {}
            }
        }
    }

    info!("X11 listener stop requested");
    Ok(())
}

fn is_auto_repeat(release: &KeyReleaseEvent, press: &KeyPressEvent) -> bool {
    release.detail == press.detail && release.time == press.time
}

/// Normalize modifier mask by removing lock keys
fn normalize_modmask(state: KeyButMask) -> ModMask {
    let state_u16: u16 = state.into();

    // Keep only Shift, Control, Mod1 (Alt), Mod4 (Super)
    let normalized = state_u16
        & (ModMask::SHIFT.bits()
            | ModMask::CONTROL.bits()
            | ModMask::M1.bits()
            | ModMask::M4.bits());

    ModMask::from(normalized)
}

/// Convert a binding to an X11 keycode and modifier mask
fn binding_to_x11_key(binding: &HotkeyBinding) -> Option<(Keycode, ModMask)> {
    let x11_keycode = evdev_keycode_to_x11(binding.key_code)?;

    let mut modmask = ModMask::from(0u16);

    if binding.ctrl {
        modmask |= ModMask::CONTROL;
    }
    if binding.shift {
        modmask |= ModMask::SHIFT;
    }
    if binding.alt {
        modmask |= ModMask::M1;
    }
    if binding.super_key {
        modmask |= ModMask::M4;
    }

    Some((x11_keycode, modmask))
}

/// X11 keycodes are evdev keycode + 8 on modern Linux servers
fn evdev_keycode_to_x11(evdev_code: u16) -> Option<Keycode> {
    let x11_code = evdev_code.checked_add(EVDEV_KEYCODE_OFFSET)?;

    if (MIN_KEYCODE..=MAX_KEYCODE).contains(&x11_code) {
        Some(x11_code as Keycode)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evdev_to_x11_keycode() {
        assert_eq!(evdev_keycode_to_x11(1), Some(9)); // ESC
        assert_eq!(evdev_keycode_to_x11(49), Some(57)); // N
        assert_eq!(evdev_keycode_to_x11(0), Some(8));
        assert_eq!(evdev_keycode_to_x11(247), Some(255));
        assert_eq!(evdev_keycode_to_x11(248), None);
        assert_eq!(evdev_keycode_to_x11(u16::MAX), None);
    }

    #[test]
    fn test_binding_to_x11_key() {
        let binding: HotkeyBinding = "Ctrl+Alt+N".parse().unwrap();
        assert_eq!(
            binding_to_x11_key(&binding),
            Some((57, ModMask::CONTROL | ModMask::M1))
        );

        let binding: HotkeyBinding = "Super+Shift+T".parse().unwrap();
        assert_eq!(
            binding_to_x11_key(&binding),
            Some((28, ModMask::SHIFT | ModMask::M4))
        );

        let unmappable = HotkeyBinding::new(300, true, false, false, false);
        assert_eq!(binding_to_x11_key(&unmappable), None);
    }

    #[test]
    fn test_normalize_modmask_drops_locks() {
        let state =
            KeyButMask::from(ModMask::CONTROL.bits() | ModMask::M1.bits() | ModMask::M2.bits());
        assert_eq!(normalize_modmask(state), ModMask::CONTROL | ModMask::M1);

        let state = KeyButMask::from(ModMask::SHIFT.bits() | ModMask::LOCK.bits());
        assert_eq!(normalize_modmask(state), ModMask::SHIFT);

        // Mouse button state bits are ignored too
        let state = KeyButMask::from(ModMask::M4.bits() | u16::from(KeyButMask::BUTTON1));
        assert_eq!(normalize_modmask(state), ModMask::M4);
    }

    fn key_event(detail: Keycode, time: Timestamp) -> KeyPressEvent {
        KeyPressEvent {
            response_type: KEY_PRESS_EVENT,
            detail,
            sequence: 0,
            time,
            root: 0,
            event: 0,
            child: 0,
            root_x: 0,
            root_y: 0,
            event_x: 0,
            event_y: 0,
            state: KeyButMask::from(0u16),
            same_screen: true,
        }
    }

    #[test]
    fn test_auto_repeat_needs_same_key_and_time() {
        let release = key_event(57, 1000);
        assert!(is_auto_repeat(&release, &key_event(57, 1000)));
        assert!(!is_auto_repeat(&release, &key_event(57, 1001)));
        assert!(!is_auto_repeat(&release, &key_event(58, 1000)));
    }

    #[test]
    fn test_lock_masks_cover_numlock_and_capslock() {
        let masks = ignored_lock_masks();
        assert_eq!(masks.len(), 4);
        assert!(masks.contains(&(ModMask::M2 | ModMask::LOCK)));
    }
}
