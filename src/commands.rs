//! Configuration editing subcommands
//!
//! Each command loads the binding table, applies one change and saves it.
//! None of them touch a running launcher; it keeps the table it started with.

use anyhow::{Context, Result, bail};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::{Action, BindingTable, HotkeyBinding, KindHint};
use crate::daemon::{ActionLauncher, Dispatcher};
use crate::error::LauncherError;

/// Load the table, treating a missing file as empty
fn load_or_empty(path: &Path) -> Result<BindingTable> {
    match BindingTable::load(path) {
        Ok(table) => Ok(table),
        Err(LauncherError::ConfigRead { source, .. }) if source.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "Config file not found, starting from an empty table");
            Ok(BindingTable::new())
        }
        Err(e) => Err(e.into()),
    }
}

fn write_rows(out: &mut impl Write, rows: &[(&HotkeyBinding, &Action)]) -> Result<()> {
    for (binding, action) in rows {
        writeln!(
            out,
            "{:<28} {:<8} {}",
            binding.display_name(),
            action.kind_name(),
            action.target
        )?;
    }
    Ok(())
}

/// Validate the config and print what would be registered
pub fn check(path: &Path, out: &mut impl Write) -> Result<()> {
    let table = BindingTable::load(path)?;
    write_rows(out, &table.sorted())?;
    writeln!(out, "{} binding(s) OK in {}", table.len(), path.display())?;
    Ok(())
}

/// Print bindings, optionally filtered by a case-insensitive substring
pub fn list(path: &Path, filter: Option<&str>, out: &mut impl Write) -> Result<()> {
    let table = load_or_empty(path)?;
    let rows = table.search(filter.unwrap_or_default());

    if rows.is_empty() {
        writeln!(out, "No hotkeys found")?;
        return Ok(());
    }

    write_rows(out, &rows)
}

/// Add or replace a binding
pub fn add(
    path: &Path,
    combo: &str,
    target: &str,
    kind: KindHint,
    out: &mut impl Write,
) -> Result<()> {
    let binding: HotkeyBinding = combo.parse()?;
    let action = Action::parse(target, kind)?;

    let mut table = load_or_empty(path)?;
    let description = format!("{} -> {} ({})", binding, action.target, action.kind_name());

    match table.insert(binding, action) {
        Some(previous) => writeln!(out, "Replaced {} (was {})", description, previous)?,
        None => writeln!(out, "Added {}", description)?,
    }

    table.save(path)
}

/// Remove a binding; it is an error if the hotkey is not bound
pub fn remove(path: &Path, combo: &str, out: &mut impl Write) -> Result<()> {
    let binding: HotkeyBinding = combo.parse()?;
    let mut table = BindingTable::load(path)?;

    let Some(action) = table.remove(&binding) else {
        bail!("No binding for {} in {}", binding, path.display());
    };

    table.save(path)?;
    writeln!(out, "Removed {} -> {}", binding, action)?;
    Ok(())
}

/// Remove every binding
pub fn clear(path: &Path, out: &mut impl Write) -> Result<()> {
    let mut table = load_or_empty(path)?;
    if table.is_empty() {
        writeln!(out, "Nothing to clear")?;
        return Ok(());
    }

    let count = table.len();
    table.clear();
    table.save(path)?;
    writeln!(out, "Cleared {} hotkey(s)", count)?;
    Ok(())
}

/// Run the action bound to `combo` once, without registering anything
pub fn trigger<L: ActionLauncher>(
    path: &Path,
    combo: &str,
    launcher: L,
    out: &mut impl Write,
) -> Result<()> {
    let binding: HotkeyBinding = combo.parse()?;
    let table = BindingTable::load(path)?;

    let action = table
        .lookup(&binding)
        .cloned()
        .with_context(|| format!("No binding for {} in {}", binding, path.display()))?;

    Dispatcher::new(Arc::new(table), launcher).execute(&action)?;
    writeln!(out, "Triggered {} -> {}", binding, action)?;
    Ok(())
}
