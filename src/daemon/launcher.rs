//! Launching actions as detached processes

use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use tracing::{debug, info, warn};

use super::dispatcher::ActionLauncher;
use crate::constants::action::URL_PLACEHOLDER;
use crate::error::LauncherError;

/// Launches commands and URLs on the local system
#[derive(Debug, Clone, Default)]
pub struct SystemLauncher {
    /// Custom URL handler split into words, `{url}` not yet substituted
    url_handler: Option<Vec<String>>,
}

impl SystemLauncher {
    /// `url_handler` replaces the desktop default for URLs, e.g. "firefox --new-tab {url}"
    pub fn new(url_handler: Option<&str>) -> Result<Self, LauncherError> {
        let url_handler = match url_handler.map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(template) => {
                // Split before substitution so the URL always stays a single argument
                let words = shell_words::split(template).map_err(|e| {
                    LauncherError::parse(template, format!("invalid URL handler: {}", e))
                })?;
                if words.is_empty() {
                    return Err(LauncherError::parse(template, "empty URL handler"));
                }
                Some(words)
            }
        };

        Ok(Self { url_handler })
    }

    /// Handler argv for `url`; the URL is appended when there is no placeholder
    fn handler_command(&self, url: &str) -> Option<Vec<String>> {
        let template = self.url_handler.as_ref()?;

        let mut parts: Vec<String> = template
            .iter()
            .map(|word| word.replace(URL_PLACEHOLDER, url))
            .collect();

        if !template.iter().any(|word| word.contains(URL_PLACEHOLDER)) {
            parts.push(url.to_string());
        }

        Some(parts)
    }
}

impl ActionLauncher for SystemLauncher {
    fn spawn_command(&self, program: &str, args: &[String]) -> Result<(), LauncherError> {
        // Own process group so terminal signals aimed at the launcher skip the child
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn()
            .map_err(|source| LauncherError::Execution {
                target: program.to_string(),
                source,
            })?;

        info!(pid = child.id(), program = %program, "Command launched");
        reap_in_background(child);
        Ok(())
    }

    fn open_url(&self, url: &str) -> Result<(), LauncherError> {
        match self.handler_command(url) {
            Some(parts) => self.spawn_command(&parts[0], &parts[1..]),
            None => open::that_detached(url).map_err(|source| LauncherError::Execution {
                target: url.to_string(),
                source,
            }),
        }
    }

    fn open_path(&self, path: &Path) -> Result<(), LauncherError> {
        open::that_detached(path).map_err(|source| LauncherError::Execution {
            target: path.display().to_string(),
            source,
        })
    }
}

/// Collect the child's exit status off the dispatch path so it never lingers as a zombie
fn reap_in_background(mut child: Child) {
    let pid = child.id();
    let spawned = thread::Builder::new()
        .name(format!("reap-{}", pid))
        .spawn(move || match child.wait() {
            Ok(status) => debug!(pid, status = %status, "Launched process exited"),
            Err(e) => warn!(pid, error = %e, "Failed to wait for launched process"),
        });

    if let Err(e) = spawned {
        warn!(pid, error = %e, "Failed to start reaper thread, process will not be reaped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_placeholder_stays_one_argument() {
        let launcher = SystemLauncher::new(Some("firefox --new-tab {url}")).unwrap();
        assert_eq!(
            launcher.handler_command("https://example.org/a b"),
            Some(vec![
                "firefox".to_string(),
                "--new-tab".to_string(),
                "https://example.org/a b".to_string(),
            ])
        );
    }

    #[test]
    fn test_handler_without_placeholder_appends_url() {
        let launcher = SystemLauncher::new(Some("chromium")).unwrap();
        assert_eq!(
            launcher.handler_command("https://youtube.com"),
            Some(vec!["chromium".to_string(), "https://youtube.com".to_string()])
        );
    }

    #[test]
    fn test_default_handler() {
        assert_eq!(SystemLauncher::new(None).unwrap().handler_command("x"), None);
        assert_eq!(SystemLauncher::new(Some("  ")).unwrap().handler_command("x"), None);
        assert!(SystemLauncher::new(Some("firefox 'unterminated")).is_err());
    }

    #[test]
    fn test_spawn_missing_binary_is_execution_error() {
        let launcher = SystemLauncher::default();
        let err = launcher
            .spawn_command("/nonexistent/hotkey-launcher-test-binary", &[])
            .unwrap_err();
        assert!(matches!(err, LauncherError::Execution { .. }));
    }

    #[test]
    fn test_spawn_does_not_wait_for_child() {
        let launcher = SystemLauncher::default();
        let started = std::time::Instant::now();
        launcher
            .spawn_command("sleep", &["5".to_string()])
            .unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }
}
