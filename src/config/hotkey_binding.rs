//! Hotkey binding descriptors and key code mapping

use evdev::KeyCode;
use std::fmt;
use std::str::FromStr;

use crate::constants::input::KEY_PREFIX;
use crate::error::LauncherError;

/// A keyboard hotkey: a set of modifiers plus exactly one non-modifier key
///
/// Equality and hashing cover the key and the modifier set, so the order in
/// which modifiers were written in the config does not matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HotkeyBinding {
    /// evdev key code (e.g., KEY_N = 49, KEY_F1 = 59)
    pub key_code: u16,

    /// Control key pressed
    pub ctrl: bool,

    /// Shift key pressed
    pub shift: bool,

    /// Alt key pressed
    pub alt: bool,

    /// Super/Windows key pressed
    pub super_key: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    Ctrl,
    Shift,
    Alt,
    Super,
}

impl HotkeyBinding {
    /// Create a new hotkey binding
    pub fn new(key_code: u16, ctrl: bool, shift: bool, alt: bool, super_key: bool) -> Self {
        Self {
            key_code,
            ctrl,
            shift,
            alt,
            super_key,
        }
    }

    /// Canonical textual form, modifiers ordered Ctrl, Shift, Alt, Super
    pub fn display_name(&self) -> String {
        let mut parts = Vec::new();

        if self.ctrl {
            parts.push("Ctrl".to_string());
        }
        if self.shift {
            parts.push("Shift".to_string());
        }
        if self.alt {
            parts.push("Alt".to_string());
        }
        if self.super_key {
            parts.push("Super".to_string());
        }

        parts.push(key_code_to_name(self.key_code));

        parts.join("+")
    }
}

impl fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl FromStr for HotkeyBinding {
    type Err = LauncherError;

    /// Parse descriptors like "Ctrl+Alt+N" or "super + shift + Page Up"
    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        if descriptor.trim().is_empty() {
            return Err(LauncherError::parse(descriptor, "empty hotkey"));
        }

        let mut binding = HotkeyBinding::new(0, false, false, false, false);
        let mut main_key: Option<u16> = None;

        for token in descriptor.split('+') {
            let token = token.trim();
            if token.is_empty() {
                return Err(LauncherError::parse(descriptor, "empty key name"));
            }

            if let Some(modifier) = parse_modifier(token) {
                match modifier {
                    Modifier::Ctrl => binding.ctrl = true,
                    Modifier::Shift => binding.shift = true,
                    Modifier::Alt => binding.alt = true,
                    Modifier::Super => binding.super_key = true,
                }
                continue;
            }

            let code = parse_key_name(token).ok_or_else(|| {
                LauncherError::parse(descriptor, format!("unknown key name '{}'", token))
            })?;

            if let Some(existing) = main_key {
                return Err(LauncherError::parse(
                    descriptor,
                    format!(
                        "more than one non-modifier key ('{}' and '{}')",
                        key_code_to_name(existing),
                        token
                    ),
                ));
            }
            main_key = Some(code);
        }

        match main_key {
            Some(code) => {
                binding.key_code = code;
                Ok(binding)
            }
            None => Err(LauncherError::parse(
                descriptor,
                "no non-modifier key found",
            )),
        }
    }
}

/// Upper-cased name with whitespace and any KEY_ prefix removed
fn compact_key_name(token: &str) -> String {
    let compact: String = token
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();

    match compact.strip_prefix(KEY_PREFIX) {
        Some(rest) => rest.to_string(),
        None => compact,
    }
}

fn parse_modifier(token: &str) -> Option<Modifier> {
    match compact_key_name(token).as_str() {
        "CTRL" | "CONTROL" | "LEFTCTRL" | "RIGHTCTRL" | "LCTRL" | "RCTRL" => Some(Modifier::Ctrl),
        "SHIFT" | "LEFTSHIFT" | "RIGHTSHIFT" | "LSHIFT" | "RSHIFT" => Some(Modifier::Shift),
        "ALT" | "OPTION" | "LEFTALT" | "RIGHTALT" | "LALT" | "RALT" => Some(Modifier::Alt),
        "SUPER" | "WIN" | "WINDOWS" | "META" | "CMD" | "COMMAND" | "LOGO" | "LEFTMETA"
        | "RIGHTMETA" | "LSUPER" | "RSUPER" => Some(Modifier::Super),
        _ => None,
    }
}

/// Convert a user-facing key name to an evdev key code
///
/// Accepts evdev names with or without the KEY_ prefix ("n", "F5", "KEY_TAB"),
/// the spaced names produced by [`key_code_to_name`] ("Page Up", "Numpad 1"),
/// and a handful of common aliases.
pub fn parse_key_name(token: &str) -> Option<u16> {
    let compact = compact_key_name(token);

    let name = match compact.as_str() {
        "ESCAPE" => "ESC".to_string(),
        "RETURN" => "ENTER".to_string(),
        "DEL" => "DELETE".to_string(),
        "INS" => "INSERT".to_string(),
        "PGUP" => "PAGEUP".to_string(),
        "PGDN" | "PGDOWN" => "PAGEDOWN".to_string(),
        "PRINT" | "PRINTSCREEN" | "PRTSC" => "SYSRQ".to_string(),
        "PLAY/PAUSE" => "PLAYPAUSE".to_string(),
        "NUMPADPERIOD" => "KPDOT".to_string(),
        s if s.starts_with("NUMPAD") => format!("KP{}", &s["NUMPAD".len()..]),
        s => s.to_string(),
    };

    linux_name_to_key_code(&format!("{}{}", KEY_PREFIX, name))
}

/// Convert evdev key code to human-readable name
pub fn key_code_to_name(code: u16) -> String {
    // Get the Linux key name from evdev (e.g., "KEY_TAB", "KEY_F1")
    let linux_name = format!("{:?}", KeyCode(code));

    let name = linux_name.strip_prefix(KEY_PREFIX).unwrap_or(&linux_name);

    match name {
        "ESC" => "Esc".to_string(),
        "BACKSPACE" => "Backspace".to_string(),
        "ENTER" => "Enter".to_string(),
        "SPACE" => "Space".to_string(),
        "CAPSLOCK" => "Caps Lock".to_string(),
        "NUMLOCK" => "Num Lock".to_string(),
        "SCROLLLOCK" => "Scroll Lock".to_string(),
        "SYSRQ" => "Print Screen".to_string(),

        "PAGEUP" => "Page Up".to_string(),
        "PAGEDOWN" => "Page Down".to_string(),

        "VOLUMEUP" => "Volume Up".to_string(),
        "VOLUMEDOWN" => "Volume Down".to_string(),
        "PLAYPAUSE" => "Play/Pause".to_string(),

        s if s.starts_with("KP") => {
            let rest = &s["KP".len()..];
            match rest {
                "DOT" => "Numpad Period".to_string(),
                _ if rest.len() == 1 => format!("Numpad {}", rest),
                _ => format!("Numpad {}{}", &rest[..1], rest[1..].to_lowercase()),
            }
        }

        // Single letters/numbers - already clean
        s if s.len() == 1 => s.to_string(),

        // Function keys (F1..F24)
        s if s.starts_with('F') && s.len() <= 3 && s[1..].chars().all(|c| c.is_ascii_digit()) => {
            s.to_string()
        }

        s => {
            let mut chars = s.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.as_str().to_lowercase().chars())
                    .collect(),
            }
        }
    }
}

/// Convert Linux input event code name (KEY_*) to evdev key code
fn linux_name_to_key_code(name: &str) -> Option<u16> {
    KeyCode::from_str(name).ok().map(|key_code| key_code.code())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(descriptor: &str) -> HotkeyBinding {
        descriptor.parse().unwrap()
    }

    #[test]
    fn test_parse_ctrl_alt_n() {
        let binding = parse("Ctrl+Alt+N");
        assert_eq!(binding.key_code, 49); // KEY_N
        assert!(binding.ctrl);
        assert!(binding.alt);
        assert!(!binding.shift);
        assert!(!binding.super_key);
    }

    #[test]
    fn test_modifier_order_and_case_are_irrelevant() {
        let canonical = parse("Ctrl+Alt+N");
        assert_eq!(parse("alt+ctrl+n"), canonical);
        assert_eq!(parse("CONTROL + ALT + N"), canonical);
        assert_eq!(parse("Alt+Control+KEY_N"), canonical);
    }

    #[test]
    fn test_modifier_aliases() {
        let binding = parse("Win+Shift+T");
        assert!(binding.super_key);
        assert!(binding.shift);
        assert_eq!(binding, parse("Super+Shift+T"));
        assert_eq!(binding, parse("meta+shift+t"));
        assert_eq!(parse("Option+F5"), parse("Alt+F5"));
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(parse("Ctrl+Space").key_code, 57);
        assert_eq!(parse("Ctrl+Escape").key_code, 1);
        assert_eq!(parse("Ctrl+Esc").key_code, 1);
        assert_eq!(parse("Ctrl+Return").key_code, 28);
        assert_eq!(parse("Alt+Page Up").key_code, 104);
        assert_eq!(parse("Alt+PgUp").key_code, 104);
        assert_eq!(parse("Super+Numpad 1").key_code, 79);
        assert_eq!(parse("Super+1").key_code, 2);
        assert_eq!(parse("F12").key_code, 88);
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "  ", "Ctrl+Alt", "Ctrl++N", "Ctrl+A+B", "Ctrl+Bogus", "+N"] {
            let err = bad.parse::<HotkeyBinding>().unwrap_err();
            assert!(
                matches!(err, LauncherError::ConfigParse { .. }),
                "expected parse error for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_display_name() {
        let binding = HotkeyBinding::new(15, false, false, false, false);
        assert_eq!(binding.display_name(), "Tab");

        let binding = HotkeyBinding::new(15, false, true, false, false);
        assert_eq!(binding.display_name(), "Shift+Tab");

        let binding = HotkeyBinding::new(59, true, false, false, false);
        assert_eq!(binding.display_name(), "Ctrl+F1");

        assert_eq!(parse("alt+ctrl+n").display_name(), "Ctrl+Alt+N");
        assert_eq!(parse("super+shift+alt+ctrl+y").to_string(), "Ctrl+Shift+Alt+Super+Y");
    }

    #[test]
    fn test_display_name_parses_back() {
        for descriptor in [
            "Ctrl+Alt+N",
            "Shift+Page Down",
            "Super+Print Screen",
            "Ctrl+Numpad Enter",
            "Alt+Numpad Period",
            "Ctrl+Volume Up",
            "Play/Pause",
            "Ctrl+Shift+Home",
        ] {
            let binding = parse(descriptor);
            assert_eq!(parse(&binding.display_name()), binding, "{}", descriptor);
        }
    }

    #[test]
    fn test_key_code_names() {
        assert_eq!(key_code_to_name(15), "Tab");
        assert_eq!(key_code_to_name(59), "F1");
        assert_eq!(key_code_to_name(57), "Space");
        assert_eq!(key_code_to_name(30), "A");
        assert_eq!(key_code_to_name(79), "Numpad 1");
        assert_eq!(key_code_to_name(96), "Numpad Enter");
        assert_eq!(key_code_to_name(104), "Page Up");
        assert_eq!(key_code_to_name(102), "Home");
        assert_eq!(key_code_to_name(113), "Mute");
    }

    #[test]
    fn test_linux_names() {
        assert_eq!(linux_name_to_key_code("KEY_TAB"), Some(15));
        assert_eq!(linux_name_to_key_code("KEY_F1"), Some(59));
        assert_eq!(linux_name_to_key_code("INVALID_KEY"), None);
        assert_eq!(parse_key_name("key_tab"), Some(15));
    }
}
