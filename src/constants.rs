//! Application-wide constants
//!
//! Magic numbers and string literals used throughout the launcher live here.

/// X11 protocol constants
pub mod x11 {
    /// Offset between evdev key codes and X11 keycodes on evdev-backed servers
    pub const EVDEV_KEYCODE_OFFSET: u16 = 8;

    /// Lowest valid X11 keycode
    pub const MIN_KEYCODE: u16 = 8;

    /// Highest valid X11 keycode
    pub const MAX_KEYCODE: u16 = 255;

    /// poll() timeout for the listener loop, bounds how long shutdown takes
    pub const POLL_TIMEOUT_MS: i32 = 250;
}

/// Input event constants (Linux input-event-codes.h)
pub mod input {
    /// Prefix used by evdev key names
    pub const KEY_PREFIX: &str = "KEY_";
}

/// Action classification and launching
pub mod action {
    /// Placeholder replaced by the URL in a custom URL handler command
    pub const URL_PLACEHOLDER: &str = "{url}";

    /// Shortest scheme accepted as a URL; single letters are drive letters
    pub const MIN_SCHEME_LEN: usize = 2;

    /// Schemes recognized without a `//` authority part
    pub const OPAQUE_SCHEMES: &[&str] = &[
        "mailto", "tel", "sms", "magnet", "news", "urn", "xmpp", "geo", "data",
    ];
}

/// Dispatcher channel sizing
pub mod dispatch {
    /// Pending hotkey presses buffered between the listener and the dispatcher
    pub const EVENT_CHANNEL_CAPACITY: usize = 32;
}

/// Configuration paths and filenames
pub mod config {
    /// Application directory name under XDG config
    pub const APP_DIR: &str = "hotkey-launcher";

    /// Configuration filename
    pub const FILENAME: &str = "hotkeys.json";

    /// Environment variable overriding the configuration file location
    pub const PATH_ENV_VAR: &str = "HOTKEY_LAUNCHER_CONFIG";
}
