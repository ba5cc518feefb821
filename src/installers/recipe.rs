//! # Install Recipe
//!
//! The routine every installer plugin runs:
//!
//! 1. **Download** the artifact into the working directory (and verify its checksum when one is configured)
//! 2. **Prepare** any prerequisite the tool needs (`Installer::prepare`)
//! 3. **Install** by extracting in-process, running the installer silently, or running the prerequisite's extractor
//! 4. **Locate** the install root, stepping into a version-named subdirectory when a root pattern is set
//! 5. **Verify** that every marker file exists
//! 6. **Configure** the environment (`Installer::configure`); a failure here is a warning, not a failed install
//!
//! A failure in steps 1-5 stops the routine and becomes a failed `InstallOutcome`.
//! Nothing in here panics or propagates an error to the caller, so one tool can never
//! take its siblings down with it.

use colored::Colorize;
use std::path::{Path, PathBuf};

use super::{InstallContext, InstallError, Installer};
use crate::libs::fetch::verify_checksum;
use crate::libs::process::expand_args;
use crate::libs::progress::ProgressTracker;
use crate::libs::utilities::compression::extract_archive;
use crate::libs::utilities::file_operations::{ensure_dir, find_install_root, missing_markers};
use crate::schemas::progress::Stage;
use crate::schemas::tools::{InstallMethod, InstallOutcome};
use crate::{log_debug, log_error, log_info, log_warn};

/// Runs the full recipe for `installer` and reports the result.
pub fn install<I: Installer + ?Sized>(
    installer: &I,
    ctx: &InstallContext,
    progress: &mut ProgressTracker<'_>,
) -> InstallOutcome {
    let tool = installer.tool();
    log_info!(
        "[Devkit::Install] Installing {}",
        tool.display_name().bold()
    );

    let root = match install_steps(installer, ctx, progress) {
        Ok(root) => root,
        Err(e) => {
            log_error!(
                "[Devkit::Install] {} failed at {}%: {}",
                tool.display_name().red(),
                progress.state().percent,
                e
            );
            progress.advance(Stage::Failed, format!("Failed: {}", e));
            return InstallOutcome::failed(tool, e.to_string());
        }
    };

    progress.advance(Stage::Configuring, "Updating environment");
    let outcome = match installer.configure(&root, ctx) {
        Ok(()) => InstallOutcome::installed(tool, root),
        Err(e) => {
            log_warn!(
                "[Devkit::Install] {} is installed but the environment was not updated: {}",
                tool.display_name().yellow(),
                e
            );
            InstallOutcome::installed_with_warning(
                tool,
                root,
                format!("environment not updated: {}", e),
            )
        }
    };

    progress.advance(Stage::Succeeded, "Installed");
    log_info!(
        "[Devkit::Install] {} installed at {}",
        tool.display_name().green(),
        outcome
            .resolved_install_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
            .cyan()
    );
    outcome
}

/// Steps 1-5. Returns the verified install root.
fn install_steps<I: Installer + ?Sized>(
    installer: &I,
    ctx: &InstallContext,
    progress: &mut ProgressTracker<'_>,
) -> Result<PathBuf, InstallError> {
    let spec = installer.spec();

    // Step 1: download.
    progress.advance(Stage::Downloading, format!("Downloading {}", spec.artifact_name));
    ensure_dir(&ctx.work_dir)
        .map_err(|e| InstallError::io(format!("creating {}", ctx.work_dir.display()), e))?;
    let artifact = ctx.artifact_path(&spec.artifact_name);
    ctx.fetcher.fetch(&spec.url, &artifact)?;
    if let Some(expected) = &spec.sha256 {
        verify_checksum(&artifact, expected)?;
    }

    // Step 2: prerequisite.
    progress.advance(Stage::Preparing, "Checking prerequisites");
    let extractor = installer.prepare(ctx, progress)?;

    // Step 3: install.
    progress.advance(Stage::Installing, "Installing");
    let target = ctx.tool_dir(&spec.install_dir);
    ensure_dir(&target).map_err(|e| InstallError::io(format!("creating {}", target.display()), e))?;
    run_method(&spec.method, &artifact, &target, extractor.as_deref(), ctx)?;

    // Step 4: locate.
    progress.advance(Stage::Extracting, "Locating install directory");
    let root = find_install_root(&target, spec.root_pattern.as_deref());

    // Step 5: verify.
    progress.advance(Stage::Verifying, "Verifying installation");
    let missing = missing_markers(&root, &spec.markers);
    if !missing.is_empty() {
        return Err(InstallError::MarkerMissing { missing });
    }
    log_debug!("[Devkit::Install] All markers present under {}", root.display());
    Ok(root)
}

/// Executes an `InstallMethod` for `artifact` into `target`.
///
/// Shared with the prerequisite installation, hence the free-standing function.
pub(crate) fn run_method(
    method: &InstallMethod,
    artifact: &Path,
    target: &Path,
    extractor: Option<&Path>,
    ctx: &InstallContext,
) -> Result<(), InstallError> {
    match method {
        InstallMethod::Archive => extract_archive(artifact, target)
            .map_err(|e| InstallError::Execution(format!("extracting {}: {}", artifact.display(), e))),
        InstallMethod::Installer { args } => {
            let args = expand_args(args, artifact, target);
            run_and_check(artifact, &args, ctx)
        }
        InstallMethod::ExternalExtract { args } => {
            let program = extractor.ok_or_else(|| {
                InstallError::Execution("no extractor available for this archive".to_string())
            })?;
            let args = expand_args(args, artifact, target);
            run_and_check(program, &args, ctx)
        }
    }
}

/// Runs an external program. A non-zero exit code is only logged: the marker
/// check that follows decides whether the install actually worked.
fn run_and_check(program: &Path, args: &[String], ctx: &InstallContext) -> Result<(), InstallError> {
    let code = ctx
        .runner
        .run(program, args)
        .map_err(|e| InstallError::Execution(format!("could not start {}: {}", program.display(), e)))?;
    if code != 0 {
        log_warn!(
            "[Devkit::Install] {} exited with code {}",
            program.display().to_string().yellow(),
            code
        );
    }
    Ok(())
}
