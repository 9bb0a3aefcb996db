//! Executable and environment discovery for exeq.
//!
//! Answers the questions the flag interpreter asks about the host: is a
//! program installed, is there a privilege escalation tool, is a graphical
//! session present, and which terminal emulator should a new window use.
//!
//! Uses the which crate for PATH lookups. Environment variables are read on
//! every call so a changed session is picked up immediately.

use std::env;

/// Terminal emulators probed in order when nothing is configured.
/// `x-terminal-emulator` first so Debian-style alternatives win.
const TERMINALS: &[&str] = &[
    "x-terminal-emulator",
    "alacritty",
    "kitty",
    "wezterm",
    "foot",
    "gnome-terminal",
    "konsole",
    "xfce4-terminal",
    "urxvt",
    "xterm",
];

/// Privilege escalation tools probed in order when none is configured.
const PRIVILEGE_TOOLS: &[&str] = &["sudo", "doas"];

/// Whether `name` resolves to an executable on PATH.
#[inline]
pub fn is_executable_available(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Pick the privilege escalation tool.
///
/// A configured preference is used only if it is actually installed; there
/// is no silent fallback past an explicit choice. Without a preference,
/// `sudo` then `doas` are probed.
pub fn find_privilege_tool(preference: Option<&str>) -> Option<String> {
    match preference {
        Some(tool) => is_executable_available(tool).then(|| tool.to_owned()),
        None => PRIVILEGE_TOOLS
            .iter()
            .find(|tool| is_executable_available(tool))
            .map(|tool| (*tool).to_owned()),
    }
}

/// Whether a graphical session is detectable.
///
/// True for a Wayland or X11 session marker, and always on macOS where
/// windows do not need a display variable.
pub fn has_display() -> bool {
    if cfg!(target_os = "macos") {
        return true;
    }
    let set = |key: &str| env::var(key).is_ok_and(|value| !value.is_empty());
    set("WAYLAND_DISPLAY") || set("DISPLAY")
}

/// Resolve the terminal emulator command for new windows.
///
/// `TERMCMD` wins, then a configured override, then the probe list. The
/// final fallback is `xterm` even when nothing was found, so the spawn
/// failure surfaces through the normal logging path.
pub fn find_terminal_emulator(preference: Option<&str>) -> String {
    if let Ok(term) = env::var("TERMCMD")
        && !term.is_empty()
    {
        return term;
    }
    if let Some(term) = preference
        && is_executable_available(term)
    {
        return term.to_owned();
    }
    TERMINALS
        .iter()
        .find(|term| is_executable_available(term))
        .map_or_else(|| "xterm".to_owned(), |term| (*term).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_executable_is_reported_missing() {
        assert!(!is_executable_available("definitely-not-a-real-binary-v9"));
    }

    #[test]
    fn common_shell_utilities_are_found() {
        // Both live in every POSIX base system the tests run on.
        if cfg!(unix) {
            assert!(is_executable_available("sh"));
            assert!(is_executable_available("true"));
        }
    }

    #[test]
    fn impossible_privilege_preference_yields_none() {
        let tool = find_privilege_tool(Some("definitely-not-a-real-binary-v9"));
        assert_eq!(tool, None);
    }

    #[test]
    fn terminal_fallback_is_always_non_empty() {
        let term = find_terminal_emulator(Some("definitely-not-a-real-binary-v9"));
        assert!(!term.is_empty());
    }
}
