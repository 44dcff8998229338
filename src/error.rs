//! Launcher error kinds
//!
//! Configuration errors abort startup before anything is registered. Registration
//! and execution errors concern a single binding and are logged, never fatal.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LauncherError {
    /// Config file missing or unreadable
    #[error("failed to read config file {path:?}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not JSON of an accepted shape
    #[error("malformed config file {path:?}")]
    ConfigMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A descriptor or target inside the config could not be parsed
    #[error("invalid binding '{descriptor}': {reason}")]
    ConfigParse { descriptor: String, reason: String },

    /// The OS refused to register a hotkey
    #[error("failed to register hotkey {binding}: {reason}")]
    Registration { binding: String, reason: String },

    /// An action target could not be launched or opened
    #[error("failed to launch '{target}'")]
    Execution {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

impl LauncherError {
    pub fn parse(descriptor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigParse {
            descriptor: descriptor.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_are_chained() {
        use std::error::Error;

        let err = LauncherError::Execution {
            target: "missing-binary".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.to_string(), "failed to launch 'missing-binary'");
        assert!(err.source().is_some());

        let err = LauncherError::Registration {
            binding: "Ctrl+Alt+N".to_string(),
            reason: "BadAccess".to_string(),
        };
        assert_eq!(err.to_string(), "failed to register hotkey Ctrl+Alt+N: BadAccess");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_messages_name_the_binding() {
        let err = LauncherError::parse("Ctrl+Alt", "no key");
        assert_eq!(err.to_string(), "invalid binding 'Ctrl+Alt': no key");
    }
}
