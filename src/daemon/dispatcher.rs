//! Hotkey dispatch
//!
//! Resolves pressed hotkeys to their actions and hands them to a launcher.
//! Failures are reported per press; the dispatcher keeps listening.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error, info, warn};

use crate::config::{Action, ActionKind, BindingTable, HotkeyBinding};
use crate::error::LauncherError;

/// Process boundary for executing actions
pub trait ActionLauncher {
    /// Start `program` detached; must not wait for it to exit
    fn spawn_command(&self, program: &str, args: &[String]) -> Result<(), LauncherError>;

    /// Open `url` with the user's handler
    fn open_url(&self, url: &str) -> Result<(), LauncherError>;

    /// Open a document, folder or application with the desktop handler
    fn open_path(&self, path: &Path) -> Result<(), LauncherError>;
}

impl<T: ActionLauncher + ?Sized> ActionLauncher for &T {
    fn spawn_command(&self, program: &str, args: &[String]) -> Result<(), LauncherError> {
        (**self).spawn_command(program, args)
    }

    fn open_url(&self, url: &str) -> Result<(), LauncherError> {
        (**self).open_url(url)
    }

    fn open_path(&self, path: &Path) -> Result<(), LauncherError> {
        (**self).open_path(path)
    }
}

/// Why [`Dispatcher::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown future resolved
    Shutdown,
    /// The listener dropped its sender; no more hotkeys will arrive
    ListenerClosed,
}

pub struct Dispatcher<L: ActionLauncher> {
    table: Arc<BindingTable>,
    launcher: L,
}

impl<L: ActionLauncher> Dispatcher<L> {
    pub fn new(table: Arc<BindingTable>, launcher: L) -> Self {
        Self { table, launcher }
    }

    /// Execute the action bound to `binding`, if any
    pub fn dispatch(&self, binding: &HotkeyBinding) -> Result<(), LauncherError> {
        match self.table.lookup(binding) {
            Some(action) => self.execute(action),
            None => {
                debug!(binding = %binding, "No action bound to hotkey");
                Ok(())
            }
        }
    }

    pub fn execute(&self, action: &Action) -> Result<(), LauncherError> {
        match &action.kind {
            ActionKind::Url(url) => {
                info!(url = %url, "Opening URL");
                self.launcher.open_url(url)
            }
            ActionKind::Open(path) => {
                info!(path = %path.display(), "Opening file");
                self.launcher.open_path(path)
            }
            ActionKind::Command { program, args } => {
                info!(program = %program, args = ?args, "Launching command");
                self.launcher.spawn_command(program, args)
            }
        }
    }

    /// Dispatch hotkey presses until `shutdown` resolves or the listener goes away
    pub async fn run(
        &self,
        mut events: Receiver<HotkeyBinding>,
        shutdown: impl Future<Output = ()>,
    ) -> StopReason {
        info!(bindings = self.table.len(), "Hotkey dispatcher running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping dispatcher");
                    return StopReason::Shutdown;
                }

                event = events.recv() => match event {
                    Some(binding) => {
                        if let Err(e) = self.dispatch(&binding) {
                            error!(binding = %binding, error = %e, "Hotkey action failed");
                        }
                    }
                    None => {
                        warn!("Hotkey listener closed, stopping dispatcher");
                        return StopReason::ListenerClosed;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use tokio::sync::mpsc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum LaunchRequest {
        Spawn { program: String, args: Vec<String> },
        Open(String),
        OpenPath(PathBuf),
    }

    /// Records launch requests instead of touching the system
    #[derive(Default)]
    pub(crate) struct RecordingLauncher {
        pub requests: RefCell<Vec<LaunchRequest>>,
        pub fail_program: Option<String>,
    }

    impl ActionLauncher for RecordingLauncher {
        fn spawn_command(&self, program: &str, args: &[String]) -> Result<(), LauncherError> {
            self.requests.borrow_mut().push(LaunchRequest::Spawn {
                program: program.to_string(),
                args: args.to_vec(),
            });
            if self.fail_program.as_deref() == Some(program) {
                return Err(LauncherError::Execution {
                    target: program.to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            Ok(())
        }

        fn open_url(&self, url: &str) -> Result<(), LauncherError> {
            self.requests
                .borrow_mut()
                .push(LaunchRequest::Open(url.to_string()));
            Ok(())
        }

        fn open_path(&self, path: &Path) -> Result<(), LauncherError> {
            self.requests
                .borrow_mut()
                .push(LaunchRequest::OpenPath(path.to_path_buf()));
            Ok(())
        }
    }

    fn dispatcher(config: &str, launcher: RecordingLauncher) -> Dispatcher<RecordingLauncher> {
        let table = BindingTable::from_json_str(config, Path::new("test.json")).unwrap();
        Dispatcher::new(Arc::new(table), launcher)
    }

    const NOTEPAD: &str = r#"{"Ctrl+Alt+N":"notepad.exe"}"#;

    fn hotkey(descriptor: &str) -> HotkeyBinding {
        descriptor.parse().unwrap()
    }

    #[test]
    fn test_trigger_spawns_exactly_once() {
        let dispatcher = dispatcher(NOTEPAD, RecordingLauncher::default());

        dispatcher.dispatch(&hotkey("Ctrl+Alt+N")).unwrap();

        assert_eq!(
            *dispatcher.launcher.requests.borrow(),
            vec![LaunchRequest::Spawn {
                program: "notepad.exe".to_string(),
                args: vec![],
            }]
        );
    }

    #[test]
    fn test_url_binding_opens_url() {
        let dispatcher = dispatcher(
            r#"{"Ctrl+Alt+Y":"https://youtube.com"}"#,
            RecordingLauncher::default(),
        );

        dispatcher.dispatch(&hotkey("alt+ctrl+y")).unwrap();

        assert_eq!(
            *dispatcher.launcher.requests.borrow(),
            vec![LaunchRequest::Open("https://youtube.com".to_string())]
        );
    }

    #[test]
    fn test_unbound_hotkey_is_ignored() {
        let dispatcher = dispatcher(NOTEPAD, RecordingLauncher::default());

        dispatcher.dispatch(&hotkey("Ctrl+Alt+M")).unwrap();
        assert!(dispatcher.launcher.requests.borrow().is_empty());
    }

    #[test]
    fn test_execution_error_is_returned() {
        let launcher = RecordingLauncher {
            fail_program: Some("missing-binary".to_string()),
            ..Default::default()
        };
        let dispatcher = dispatcher(r#"{"Ctrl+Alt+M":"missing-binary --flag"}"#, launcher);

        let err = dispatcher.dispatch(&hotkey("Ctrl+Alt+M")).unwrap_err();
        assert!(matches!(err, LauncherError::Execution { .. }));
    }

    #[test]
    fn test_file_binding_opens_whole_path() {
        let dispatcher = dispatcher(
            r#"[{"combo": "Ctrl+Alt+D", "target": "/srv/My Files/notes.txt", "kind": "file"}]"#,
            RecordingLauncher::default(),
        );

        dispatcher.dispatch(&hotkey("Ctrl+Alt+D")).unwrap();

        assert_eq!(
            *dispatcher.launcher.requests.borrow(),
            vec![LaunchRequest::OpenPath(PathBuf::from("/srv/My Files/notes.txt"))]
        );
    }

    #[tokio::test]
    async fn test_run_reports_dead_listener() {
        let dispatcher = dispatcher(NOTEPAD, RecordingLauncher::default());

        let (tx, rx) = mpsc::channel::<HotkeyBinding>(1);
        drop(tx);

        let reason = dispatcher.run(rx, std::future::pending()).await;
        assert_eq!(reason, StopReason::ListenerClosed);
        assert!(dispatcher.launcher.requests.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_run_survives_failures_until_listener_closes() {
        let launcher = RecordingLauncher {
            fail_program: Some("missing-binary".to_string()),
            ..Default::default()
        };
        let dispatcher = dispatcher(
            r#"{"Ctrl+Alt+M":"missing-binary", "Ctrl+Alt+N":"notepad.exe"}"#,
            launcher,
        );

        let (tx, rx) = mpsc::channel(8);
        tx.send(hotkey("Ctrl+Alt+M")).await.unwrap();
        tx.send(hotkey("Ctrl+Alt+N")).await.unwrap();
        tx.send(hotkey("Ctrl+Alt+N")).await.unwrap();
        drop(tx);

        let reason = dispatcher.run(rx, std::future::pending()).await;
        assert_eq!(reason, StopReason::ListenerClosed);

        let requests = dispatcher.launcher.requests.borrow();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            requests[2],
            LaunchRequest::Spawn {
                program: "notepad.exe".to_string(),
                args: vec![],
            }
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let dispatcher = dispatcher(NOTEPAD, RecordingLauncher::default());

        let (_tx, rx) = mpsc::channel::<HotkeyBinding>(1);
        let reason = dispatcher.run(rx, std::future::ready(())).await;
        assert_eq!(reason, StopReason::Shutdown);

        assert!(dispatcher.launcher.requests.borrow().is_empty());
    }
}
