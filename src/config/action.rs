//! Action targets bound to hotkeys
//!
//! A target string is classified exactly once, when the config is loaded, into
//! a URL to open, a file to hand to the desktop handler, or a command line to
//! spawn.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::constants::action::{MIN_SCHEME_LEN, OPAQUE_SCHEMES};
use crate::error::LauncherError;

/// How a target string should be interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindHint {
    /// Classify by URL scheme prefix
    #[default]
    Auto,
    /// Always open with the URL handler
    Url,
    /// Open the whole target (document, folder, app) with the desktop handler
    File,
    /// Always spawn as a command line
    Command,
}

/// Resolved effect of a binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Url(String),
    /// Path opened as-is, never split into words
    Open(PathBuf),
    Command { program: String, args: Vec<String> },
}

/// An action target together with its classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Target exactly as written in the config
    pub target: String,
    pub kind: ActionKind,
}

impl Action {
    /// Classify `target` according to `hint`
    pub fn parse(target: &str, hint: KindHint) -> Result<Self, LauncherError> {
        let trimmed = target.trim();
        if trimmed.is_empty() {
            return Err(LauncherError::parse(target, "empty action target"));
        }

        let hint = match hint {
            KindHint::Auto if has_url_scheme(trimmed) => KindHint::Url,
            KindHint::Auto => KindHint::Command,
            explicit => explicit,
        };

        let kind = match hint {
            KindHint::Url => ActionKind::Url(trimmed.to_string()),
            KindHint::File => ActionKind::Open(expand_home(trimmed)),
            KindHint::Auto | KindHint::Command => {
                let mut words = shell_words::split(trimmed).map_err(|e| {
                    LauncherError::parse(target, format!("invalid command line: {}", e))
                })?;
                if words.is_empty() {
                    return Err(LauncherError::parse(target, "empty command line"));
                }
                let program = words.remove(0);
                ActionKind::Command {
                    program,
                    args: words,
                }
            }
        };

        Ok(Self {
            target: trimmed.to_string(),
            kind,
        })
    }

    /// Hint that reproduces this classification when saved
    pub fn hint(&self) -> KindHint {
        match self.kind {
            ActionKind::Url(_) => KindHint::Url,
            ActionKind::Open(_) => KindHint::File,
            ActionKind::Command { .. } => KindHint::Command,
        }
    }

    /// Short label for listings
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ActionKind::Url(_) => "url",
            ActionKind::Open(_) => "file",
            ActionKind::Command { .. } => "command",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.target)
    }
}

/// Expand a leading `~` to the home directory
fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => Some(""),
        Some(rest) => rest.strip_prefix('/'),
        None => None,
    };

    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// True when the target starts with a URL scheme per RFC 3986
///
/// Hierarchical URLs need `scheme://`, so `localhost:8080` stays a command.
/// Schemes without an authority ("mailto:", "tel:") are accepted from a fixed
/// list. Single-letter schemes are rejected so Windows drive letters
/// ("C:\...") stay commands.
fn has_url_scheme(target: &str) -> bool {
    let Some((scheme, rest)) = target.split_once(':') else {
        return false;
    };

    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid_scheme = starts_alpha
        && scheme.len() >= MIN_SCHEME_LEN
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    if !valid_scheme || rest.is_empty() || rest.starts_with(char::is_whitespace) {
        return false;
    }

    match rest.strip_prefix("//") {
        Some(authority) => !authority.is_empty(),
        None => OPAQUE_SCHEMES
            .iter()
            .any(|opaque| scheme.eq_ignore_ascii_case(opaque)),
    }
}
