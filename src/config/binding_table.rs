//! Binding table loading and persistence
//!
//! The config file is either a JSON object mapping hotkey descriptors to
//! targets, or a list of `{"combo", "target", "kind"}` entries. Entries are
//! read in document order so duplicate hotkeys resolve last-wins.

use anyhow::{Context, Result};
use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::action::{Action, KindHint};
use super::hotkey_binding::HotkeyBinding;
use crate::constants::config::{APP_DIR, FILENAME, PATH_ENV_VAR};
use crate::error::LauncherError;

/// One binding as written in the entry-list config format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingEntry {
    pub combo: String,
    pub target: String,
    #[serde(default)]
    pub kind: KindHint,
}

/// Config document in either accepted shape, flattened to entries
struct RawConfig(Vec<BindingEntry>);

impl<'de> Deserialize<'de> for RawConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RawConfigVisitor;

        impl<'de> Visitor<'de> for RawConfigVisitor {
            type Value = RawConfig;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping hotkeys to targets, or a list of binding entries")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((combo, target)) = map.next_entry::<String, String>()? {
                    entries.push(BindingEntry {
                        combo,
                        target,
                        kind: KindHint::Auto,
                    });
                }
                Ok(RawConfig(entries))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(entry) = seq.next_element::<BindingEntry>()? {
                    entries.push(entry);
                }
                Ok(RawConfig(entries))
            }
        }

        deserializer.deserialize_any(RawConfigVisitor)
    }
}

/// Immutable-at-runtime mapping from hotkey to action
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    bindings: HashMap<HotkeyBinding, Action>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config location, honouring the override environment variable
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(PATH_ENV_VAR).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }

        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(FILENAME);
        path
    }

    /// Load the table from a JSON config file
    pub fn load(path: &Path) -> Result<Self, LauncherError> {
        let contents = fs::read_to_string(path).map_err(|source| LauncherError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        let table = Self::from_json_str(&contents, path)?;
        info!(
            bindings = table.len(),
            path = %path.display(),
            "Loaded hotkey configuration"
        );
        Ok(table)
    }

    /// Parse config text; `origin` is only used for error reporting
    pub fn from_json_str(text: &str, origin: &Path) -> Result<Self, LauncherError> {
        let RawConfig(entries) =
            serde_json::from_str(text).map_err(|source| LauncherError::ConfigMalformed {
                path: origin.to_path_buf(),
                source,
            })?;

        Self::from_entries(entries)
    }

    /// Build a table from entries in order; later duplicates replace earlier ones
    pub fn from_entries(
        entries: impl IntoIterator<Item = BindingEntry>,
    ) -> Result<Self, LauncherError> {
        let mut table = Self::new();

        for entry in entries {
            let binding: HotkeyBinding = entry.combo.parse()?;
            let action = Action::parse(&entry.target, entry.kind).map_err(|e| match e {
                LauncherError::ConfigParse { reason, .. } => LauncherError::ConfigParse {
                    descriptor: entry.combo.clone(),
                    reason,
                },
                other => other,
            })?;

            if let Some(previous) = table.insert(binding, action) {
                warn!(
                    binding = %binding,
                    replaced = %previous,
                    "Duplicate hotkey in config, last definition wins"
                );
            }
        }

        Ok(table)
    }

    /// Add or replace a binding, returning the previous action
    pub fn insert(&mut self, binding: HotkeyBinding, action: Action) -> Option<Action> {
        self.bindings.insert(binding, action)
    }

    pub fn remove(&mut self, binding: &HotkeyBinding) -> Option<Action> {
        self.bindings.remove(binding)
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    pub fn lookup(&self, binding: &HotkeyBinding) -> Option<&Action> {
        self.bindings.get(binding)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings ordered by display name, for stable listings
    pub fn sorted(&self) -> Vec<(&HotkeyBinding, &Action)> {
        let mut rows: Vec<_> = self.bindings.iter().collect();
        rows.sort_by_key(|(binding, _)| binding.display_name());
        rows
    }

    /// Bindings whose combo, kind or target contains `query` (case-insensitive)
    pub fn search(&self, query: &str) -> Vec<(&HotkeyBinding, &Action)> {
        let query = query.trim().to_lowercase();
        self.sorted()
            .into_iter()
            .filter(|(binding, action)| {
                query.is_empty()
                    || format!(
                        "{} {} {}",
                        binding.display_name(),
                        action.kind_name(),
                        action.target
                    )
                    .to_lowercase()
                    .contains(&query)
            })
            .collect()
    }

    /// Write the table as pretty JSON
    ///
    /// Uses the plain object form unless some action was forced to a kind that
    /// auto-classification would not reproduce, in which case the entry list
    /// form with explicit kinds is written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let serialized = if self.needs_explicit_kinds() {
            let entries: Vec<BindingEntry> = self
                .sorted()
                .into_iter()
                .map(|(binding, action)| BindingEntry {
                    combo: binding.display_name(),
                    target: action.target.clone(),
                    kind: action.hint(),
                })
                .collect();
            serde_json::to_string_pretty(&entries)
        } else {
            let map: BTreeMap<String, &str> = self
                .bindings
                .iter()
                .map(|(binding, action)| (binding.display_name(), action.target.as_str()))
                .collect();
            serde_json::to_string_pretty(&map)
        };
        let json_string = serialized.context("Failed to serialize bindings to JSON")?;

        fs::write(path, json_string)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        info!(bindings = self.len(), path = %path.display(), "Saved hotkey configuration");
        Ok(())
    }

    fn needs_explicit_kinds(&self) -> bool {
        self.bindings.values().any(|action| {
            let reparsed = Action::parse(&action.target, KindHint::Auto);
            let stable = matches!(&reparsed, Ok(auto) if auto.kind == action.kind);
            if !stable {
                debug!(action_target = %action.target, "Action kind differs from auto-classification");
            }
            !stable
        })
    }
}
