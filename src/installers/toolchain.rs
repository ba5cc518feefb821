//! # C/C++ Toolchain Installer
//!
//! Installs a self-contained GCC distribution.
//!
//! On Windows the toolchain ships as a `.7z` archive (WinLibs MinGW-w64), which
//! none of the in-process extractors understand. The installer therefore depends
//! on an archiving utility (7-Zip) as a **prerequisite**: before extracting, it
//! checks for an existing 7-Zip (system-wide or from a previous run), installs it
//! silently if absent, and then drives `7z x` to unpack the toolchain.
//!
//! The prerequisite is a system-wide resource. The check-and-install runs under
//! `InstallContext::prerequisite_lock` and always checks first, so a 7-Zip that
//! is already present (installed by the user, by a previous run or by another
//! worker) is reused rather than treated as an error.
//!
//! On other platforms the default is a musl-based native GCC `.tgz`, extracted
//! in-process with no prerequisite.

use colored::Colorize;
use std::path::PathBuf;

use super::recipe::run_method;
use super::{InstallContext, InstallError, Installer};
use crate::libs::progress::ProgressTracker;
use crate::libs::utilities::file_operations::ensure_dir;
use crate::schemas::progress::Stage;
use crate::schemas::tools::{InstallMethod, InstallSpec, PrerequisiteSpec, ToolId};
use crate::{log_debug, log_info};

/// Built-in toolchain recipe for the current platform.
pub fn default_spec() -> InstallSpec {
    if cfg!(windows) {
        InstallSpec {
            url: "https://github.com/brechtsanders/winlibs_mingw/releases/download/14.2.0posix-19.1.1-12.0.0-ucrt-r2/winlibs-x86_64-posix-seh-gcc-14.2.0-mingw-w64ucrt-12.0.0-r2.7z".to_string(),
            artifact_name: "toolchain-winlibs.7z".to_string(),
            sha256: None,
            install_dir: "toolchain".to_string(),
            method: InstallMethod::ExternalExtract {
                args: vec![
                    "x".to_string(),
                    "{artifact}".to_string(),
                    "-o{install_dir}".to_string(),
                    "-y".to_string(),
                ],
            },
            root_pattern: Some("mingw*".to_string()),
            markers: vec!["bin/gcc.exe".to_string(), "bin/g++.exe".to_string()],
            path_entries: vec!["bin".to_string()],
            prerequisite: Some(PrerequisiteSpec {
                name: "7-Zip".to_string(),
                url: "https://www.7-zip.org/a/7z2408-x64.exe".to_string(),
                artifact_name: "prerequisite-7zip.exe".to_string(),
                install_dir: "7zip".to_string(),
                method: InstallMethod::Installer {
                    args: vec!["/S".to_string(), "/D={install_dir}".to_string()],
                },
                executable: "7z.exe".to_string(),
                system_paths: vec![
                    "C:\\Program Files\\7-Zip\\7z.exe".to_string(),
                    "C:\\Program Files (x86)\\7-Zip\\7z.exe".to_string(),
                ],
            }),
        }
    } else {
        InstallSpec {
            url: "https://musl.cc/x86_64-linux-musl-native.tgz".to_string(),
            artifact_name: "toolchain-gcc.tgz".to_string(),
            sha256: None,
            install_dir: "toolchain".to_string(),
            method: InstallMethod::Archive,
            root_pattern: Some("*-native".to_string()),
            markers: vec!["bin/gcc".to_string(), "bin/g++".to_string()],
            path_entries: vec!["bin".to_string()],
            prerequisite: None,
        }
    }
}

pub struct ToolchainInstaller {
    spec: InstallSpec,
}

impl ToolchainInstaller {
    pub fn new(spec: InstallSpec) -> Self {
        ToolchainInstaller { spec }
    }
}

impl Installer for ToolchainInstaller {
    fn tool(&self) -> ToolId {
        ToolId::Toolchain
    }

    fn spec(&self) -> &InstallSpec {
        &self.spec
    }

    fn prepare(&self, ctx: &InstallContext, progress: &mut ProgressTracker<'_>) -> Result<Option<PathBuf>, InstallError> {
        match &self.spec.prerequisite {
            Some(prerequisite) => {
                progress.advance(Stage::Preparing, format!("Checking {}", prerequisite.name));
                ensure_prerequisite(prerequisite, ctx).map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Returns a usable path to the prerequisite's executable, installing it first
/// if nothing on the machine provides it yet.
pub(crate) fn ensure_prerequisite(prerequisite: &PrerequisiteSpec, ctx: &InstallContext) -> Result<PathBuf, InstallError> {
    // Serialize the check-then-install so two callers never install at once.
    let _guard = ctx
        .prerequisite_lock
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(existing) = find_existing(prerequisite, ctx) {
        log_debug!(
            "[Devkit::Toolchain] {} already available at {}",
            prerequisite.name,
            existing.display()
        );
        return Ok(existing);
    }

    log_info!(
        "[Devkit::Toolchain] {} not found; installing it first",
        prerequisite.name.bold()
    );
    let failure = |reason: String| InstallError::Prerequisite {
        name: prerequisite.name.clone(),
        reason,
    };

    let artifact = ctx.artifact_path(&prerequisite.artifact_name);
    ctx.fetcher
        .fetch(&prerequisite.url, &artifact)
        .map_err(|e| failure(e.to_string()))?;

    let target = ctx.tool_dir(&prerequisite.install_dir);
    ensure_dir(&target).map_err(|e| failure(format!("creating {}: {}", target.display(), e)))?;
    run_method(&prerequisite.method, &artifact, &target, None, ctx).map_err(|e| failure(e.to_string()))?;

    let executable = target.join(&prerequisite.executable);
    if !executable.exists() {
        return Err(failure(format!("{} is missing after install", executable.display())));
    }
    log_info!(
        "[Devkit::Toolchain] {} installed at {}",
        prerequisite.name.green(),
        executable.display()
    );
    Ok(executable)
}

fn find_existing(prerequisite: &PrerequisiteSpec, ctx: &InstallContext) -> Option<PathBuf> {
    prerequisite
        .system_paths
        .iter()
        .map(PathBuf::from)
        .chain(std::iter::once(
            ctx.tool_dir(&prerequisite.install_dir).join(&prerequisite.executable),
        ))
        .find(|candidate| candidate.is_file())
}
