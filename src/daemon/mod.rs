//! Hotkey daemon - dispatches global hotkey presses to their actions

mod dispatcher;
mod launcher;
mod main_loop;

pub use dispatcher::{ActionLauncher, Dispatcher};
pub use launcher::SystemLauncher;
pub use main_loop::run_launcher;

#[cfg(test)]
pub(crate) use dispatcher::tests::{LaunchRequest, RecordingLauncher};
