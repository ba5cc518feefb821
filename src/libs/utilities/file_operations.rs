// Filesystem helpers shared by the installers and the orchestrator:
// idempotent directory creation, best-effort removal, marker checks and the
// "which directory is the real install root" scan.

use colored::Colorize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::{log_debug, log_warn};

/// Creates `dir` and all its parents. Succeeds if it already exists.
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// Removes `dir` recursively. Errors are logged, never returned.
///
/// # Returns
/// * `true` if the directory is gone afterwards (including when it never existed).
pub fn remove_dir_best_effort(dir: &Path) -> bool {
    if !dir.exists() {
        return true;
    }
    match fs::remove_dir_all(dir) {
        Ok(()) => {
            log_debug!("[Devkit::Cleanup] Removed {}", dir.display());
            true
        }
        Err(e) => {
            log_warn!(
                "[Devkit::Cleanup] Could not remove {}: {}",
                dir.display().to_string().yellow(),
                e
            );
            false
        }
    }
}

/// Returns the markers (relative to `root`) that do not exist.
pub fn missing_markers(root: &Path, markers: &[String]) -> Vec<PathBuf> {
    markers
        .iter()
        .map(|marker| root.join(marker))
        .filter(|path| !path.exists())
        .collect()
}

/// `*`-only glob match. `jdk*` matches `jdk-21.0.4+7`; `*` alone matches anything.
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return name == pattern;
    }

    let (first, last) = (parts[0], parts[parts.len() - 1]);
    if !name.starts_with(first) || name.len() < first.len() + last.len() || !name.ends_with(last) {
        return false;
    }

    // Middle fragments must appear in order between the prefix and the suffix.
    let mut remaining = &name[first.len()..name.len() - last.len()];
    for part in &parts[1..parts.len() - 1] {
        match remaining.find(part) {
            Some(idx) => remaining = &remaining[idx + part.len()..],
            None => return false,
        }
    }
    true
}

/// Locates the directory that should be considered "the installation".
///
/// Archives often unpack into a versioned folder (`jdk-21.0.4+7`,
/// `mingw64`, `VSCode-linux-x64`). When `pattern` is given, the immediate
/// subdirectories of `extract_root` are scanned in name order and the first
/// match wins. With no pattern or no match the extraction root itself is used.
pub fn find_install_root(extract_root: &Path, pattern: Option<&str>) -> PathBuf {
    let Some(pattern) = pattern else {
        return extract_root.to_path_buf();
    };

    let found = WalkDir::new(extract_root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .find(|entry| matches_pattern(&entry.file_name().to_string_lossy(), pattern))
        .map(|entry| entry.into_path());

    match found {
        Some(dir) => {
            log_debug!(
                "[Devkit::Install] Resolved install root {} (pattern '{}')",
                dir.display().to_string().green(),
                pattern
            );
            dir
        }
        None => {
            log_debug!(
                "[Devkit::Install] No directory matching '{}' in {}; using it as the install root",
                pattern,
                extract_root.display()
            );
            extract_root.to_path_buf()
        }
    }
}
