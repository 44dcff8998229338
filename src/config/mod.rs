//! Configuration management
//!
//! Loads the hotkey-to-action mapping from a JSON file into an immutable
//! binding table, and persists edits made through the CLI.

pub mod action;
pub mod binding_table;
pub mod hotkey_binding;

pub use action::{Action, ActionKind, KindHint};
pub use binding_table::BindingTable;
pub use hotkey_binding::HotkeyBinding;
