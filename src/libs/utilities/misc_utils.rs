// Small helpers that do not belong anywhere else.

use std::path::PathBuf;
use std::time::Duration;

/// Expands a leading `~` to the user's home directory.
/// Paths without a tilde, or a system where the home directory cannot be
/// determined, are returned unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") || path.starts_with("~\\") {
        if let Some(home) = dirs::home_dir() {
            return PathBuf::from(path.replacen('~', &home.to_string_lossy(), 1));
        }
    }
    PathBuf::from(path)
}

/// Formats an elapsed wall-clock duration as `1m 05s` or `42s`.
pub fn format_elapsed(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}
