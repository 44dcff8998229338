use std::process::Command;
use tracing::{info, warn};

/// Log the session details that decide whether global hotkeys can work
pub fn log_system_info() {
    info!("=== System Information ===");

    if let Ok(kernel) = get_command_output("uname", &["-sr"]) {
        info!("Kernel: {}", kernel);
    }

    if let Ok(os_release) = std::fs::read_to_string("/etc/os-release") {
        if let Some(name) = pretty_name(&os_release) {
            info!("OS: {}", name);
        }
    }

    for var in ["XDG_SESSION_TYPE", "XDG_CURRENT_DESKTOP", "DISPLAY"] {
        match std::env::var(var) {
            Ok(value) => info!("{}: {}", var, value),
            Err(_) => info!("{}: <unset>", var),
        }
    }

    // XWayland only delivers grabs while an X11 window has focus
    if std::env::var_os("WAYLAND_DISPLAY").is_some() {
        warn!("Wayland session detected; hotkeys are only seen through XWayland");
    }

    info!("==========================");
}

fn pretty_name(os_release: &str) -> Option<&str> {
    os_release
        .lines()
        .find_map(|line| line.strip_prefix("PRETTY_NAME="))
        .map(|name| name.trim_matches('"'))
}

fn get_command_output(cmd: &str, args: &[&str]) -> anyhow::Result<String> {
    let output = Command::new(cmd).args(args).output()?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
