#![deny(unsafe_code)]

mod commands;
mod common;
mod config;
mod constants;
mod daemon;
mod error;
mod input;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::{BindingTable, KindHint};
use daemon::SystemLauncher;

#[derive(Parser)]
#[command(name = "hotkey-launcher")]
#[command(version)]
#[command(about = "Launch programs and URLs from global hotkeys", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Hotkey config file (default: ~/.config/hotkey-launcher/hotkeys.json)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Command used to open URLs instead of the desktop default, e.g. "firefox {url}"
    #[arg(long, global = true, value_name = "CMD")]
    url_handler: Option<String>,

    /// Verbose logging plus a system report
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the configured hotkeys and launch actions until interrupted (default)
    Run,

    /// Validate the config file and print its bindings
    Check,

    /// Print the configured bindings
    List {
        /// Only show bindings whose hotkey, kind or target contains this text
        filter: Option<String>,
    },

    /// Bind a hotkey, replacing any existing binding
    Add {
        /// Hotkey such as "Ctrl+Alt+N"
        combo: String,

        /// Program with arguments, a URL, or a file to open
        target: String,

        #[arg(long, value_enum, default_value_t = KindArg::Auto)]
        kind: KindArg,
    },

    /// Unbind a hotkey
    Remove { combo: String },

    /// Unbind every hotkey
    Clear,

    /// Run the action bound to a hotkey once
    Trigger { combo: String },
}

/// How `add` should treat its target
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum KindArg {
    Auto,
    Url,
    File,
    Command,
}

impl From<KindArg> for KindHint {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Auto => KindHint::Auto,
            KindArg::Url => KindHint::Url,
            KindArg::File => KindHint::File,
            KindArg::Command => KindHint::Command,
        }
    }
}

fn init_logging(debug: bool) {
    let default_directive = if debug {
        "hotkey_launcher=debug"
    } else {
        "hotkey_launcher=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if cli.debug {
        common::debug::log_system_info();
    }

    let path = cli.config.unwrap_or_else(BindingTable::default_path);
    let command = cli.command.unwrap_or(Commands::Run);
    run_command(command, &path, cli.url_handler.as_deref(), &mut io::stdout().lock())
}

/// The URL handler is only parsed by the commands that launch actions
fn run_command(
    command: Commands,
    path: &Path,
    url_handler: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Commands::Run => {
            tracing::info!(path = %path.display(), "Loading hotkey config");
            // Config errors surface before anything is registered
            let table = BindingTable::load(path)?;
            let launcher = SystemLauncher::new(url_handler)?;

            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            rt.block_on(daemon::run_launcher(table, launcher))
        }
        Commands::Check => commands::check(path, out),
        Commands::List { filter } => commands::list(path, filter.as_deref(), out),
        Commands::Add {
            combo,
            target,
            kind,
        } => commands::add(path, &combo, &target, kind.into(), out),
        Commands::Remove { combo } => commands::remove(path, &combo, out),
        Commands::Clear => commands::clear(path, out),
        Commands::Trigger { combo } => {
            let launcher = SystemLauncher::new(url_handler)?;
            commands::trigger(path, &combo, launcher, out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const BAD_HANDLER: Option<&str> = Some("firefox 'unterminated");

    #[test]
    fn test_url_handler_ignored_by_editing_commands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotkeys.json");
        fs::write(&path, r#"{"Ctrl+Alt+N": "notepad.exe"}"#).unwrap();

        let list = Commands::List { filter: None };
        run_command(list, &path, BAD_HANDLER, &mut Vec::new()).unwrap();
        run_command(Commands::Check, &path, BAD_HANDLER, &mut Vec::new()).unwrap();

        let add = Commands::Add {
            combo: "Super+T".to_string(),
            target: "xterm".to_string(),
            kind: KindArg::Auto,
        };
        run_command(add, &path, BAD_HANDLER, &mut Vec::new()).unwrap();
        assert_eq!(BindingTable::load(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_url_handler_checked_by_trigger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotkeys.json");
        fs::write(&path, r#"{"Ctrl+Alt+Y": "https://youtube.com"}"#).unwrap();

        let trigger = Commands::Trigger {
            combo: "Ctrl+Alt+Y".to_string(),
        };
        assert!(run_command(trigger, &path, BAD_HANDLER, &mut Vec::new()).is_err());
    }
}
