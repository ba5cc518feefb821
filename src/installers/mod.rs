// Installer plugins.
//
// Every tool is an `Installer`: a static `InstallSpec` plus two optional hooks
// (`prepare` for a prerequisite, `configure` for environment changes). The
// shared download -> install -> locate -> verify -> configure routine lives in
// `recipe`, so the per-tool modules only describe what differs.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::libs::environment::{EnvError, EnvMutator};
use crate::libs::fetch::{FetchError, Fetcher};
use crate::libs::process::ProcessRunner;
use crate::libs::progress::ProgressTracker;
use crate::schemas::tools::{InstallOutcome, InstallSpec, ToolId};

/// The shared download -> install -> verify routine.
pub(crate) mod recipe;

/// C/C++ toolchain (GCC). Owns the archiver prerequisite.
pub(crate) mod toolchain;

/// Python runtime.
pub(crate) mod runtime;

/// Java Development Kit. Also sets JAVA_HOME.
pub(crate) mod jdk;

/// Visual Studio Code.
pub(crate) mod editor;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("download failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("prerequisite {name} could not be installed: {reason}")]
    Prerequisite { name: String, reason: String },
    #[error("install step failed: {0}")]
    Execution(String),
    #[error("installation incomplete, missing {}", format_paths(.missing))]
    MarkerMissing { missing: Vec<PathBuf> },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl InstallError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        InstallError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Collaborators and locations shared by every installer of a run.
pub struct InstallContext {
    /// Base directory; each tool writes only into its own subdirectory.
    pub install_root: PathBuf,
    /// Scratch directory for downloads, removed after the run.
    pub work_dir: PathBuf,
    pub fetcher: Arc<dyn Fetcher>,
    pub runner: Arc<dyn ProcessRunner>,
    pub env: EnvMutator,
    /// Held while a system-wide prerequisite is checked and installed.
    pub prerequisite_lock: Mutex<()>,
}

impl InstallContext {
    pub fn new(
        install_root: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
        fetcher: Arc<dyn Fetcher>,
        runner: Arc<dyn ProcessRunner>,
        env: EnvMutator,
    ) -> Self {
        InstallContext {
            install_root: install_root.into(),
            work_dir: work_dir.into(),
            fetcher,
            runner,
            env,
            prerequisite_lock: Mutex::new(()),
        }
    }

    /// Where the downloaded artifact with this name is stored.
    pub fn artifact_path(&self, artifact_name: &str) -> PathBuf {
        self.work_dir.join(artifact_name)
    }

    /// The directory owned by a tool (or prerequisite) under the install root.
    pub fn tool_dir(&self, install_dir: &str) -> PathBuf {
        self.install_root.join(install_dir)
    }
}

/// One installable tool.
pub trait Installer: Send + Sync {
    fn tool(&self) -> ToolId;

    fn spec(&self) -> &InstallSpec;

    /// Makes sure anything the install step depends on is present.
    ///
    /// Returns the program to use for `InstallMethod::ExternalExtract`, if any.
    fn prepare(&self, _ctx: &InstallContext, _progress: &mut ProgressTracker<'_>) -> Result<Option<PathBuf>, InstallError> {
        Ok(None)
    }

    /// Publishes the verified installation at `root` to the environment.
    fn configure(&self, root: &Path, ctx: &InstallContext) -> Result<(), EnvError> {
        add_path_entries(&self.spec().path_entries, root, ctx)
    }

    /// Runs the full install routine. Never panics on install errors; every
    /// failure is reported through the returned outcome.
    fn install(&self, ctx: &InstallContext, progress: &mut ProgressTracker<'_>) -> InstallOutcome {
        recipe::install(self, ctx, progress)
    }
}

/// Appends each `entries` directory (relative to `root`, `""` meaning `root`) to PATH.
pub(crate) fn add_path_entries(entries: &[String], root: &Path, ctx: &InstallContext) -> Result<(), EnvError> {
    for entry in entries {
        let dir = if entry.is_empty() { root.to_path_buf() } else { root.join(entry) };
        ctx.env.add_to_path(&dir)?;
    }
    Ok(())
}

/// Lookup table from tool to its installer.
pub type InstallerRegistry = HashMap<ToolId, Arc<dyn Installer>>;

/// Builds the registry from the built-in recipes, replacing any tool whose
/// spec is overridden in the configuration.
pub fn default_registry(overrides: &HashMap<ToolId, InstallSpec>) -> InstallerRegistry {
    let spec_for = |tool: ToolId, default: InstallSpec| overrides.get(&tool).cloned().unwrap_or(default);

    let mut registry: InstallerRegistry = HashMap::new();
    registry.insert(
        ToolId::Toolchain,
        Arc::new(toolchain::ToolchainInstaller::new(spec_for(ToolId::Toolchain, toolchain::default_spec()))),
    );
    registry.insert(
        ToolId::Runtime,
        Arc::new(runtime::RuntimeInstaller::new(spec_for(ToolId::Runtime, runtime::default_spec()))),
    );
    registry.insert(
        ToolId::Jdk,
        Arc::new(jdk::JdkInstaller::new(spec_for(ToolId::Jdk, jdk::default_spec()))),
    );
    registry.insert(
        ToolId::Editor,
        Arc::new(editor::EditorInstaller::new(spec_for(ToolId::Editor, editor::default_spec()))),
    );
    registry
}
