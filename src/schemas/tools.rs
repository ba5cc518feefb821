// Data structures describing the tools `setup-devkit` knows how to install,
// the static recipe for each of them (`InstallSpec`) and the result of one
// install run (`InstallOutcome`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The closed set of tools that can be selected.
///
/// The declaration order doubles as the display order: `Selection` is a
/// `BTreeSet<ToolId>`, so iterating it always yields toolchain, runtime, jdk, editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolId {
    /// C/C++ compiler toolchain (GCC).
    Toolchain,
    /// Python runtime.
    Runtime,
    /// Java Development Kit.
    Jdk,
    /// Visual Studio Code.
    Editor,
}

impl ToolId {
    /// Every tool, in menu order.
    pub const ALL: [ToolId; 4] = [ToolId::Toolchain, ToolId::Runtime, ToolId::Jdk, ToolId::Editor];

    /// The number shown next to the tool in the selection menu.
    pub fn menu_number(self) -> u8 {
        match self {
            ToolId::Toolchain => 1,
            ToolId::Runtime => 2,
            ToolId::Jdk => 3,
            ToolId::Editor => 4,
        }
    }

    /// Human readable name used in progress lines and the summary.
    pub fn display_name(self) -> &'static str {
        match self {
            ToolId::Toolchain => "C/C++ Toolchain (GCC)",
            ToolId::Runtime => "Python Runtime",
            ToolId::Jdk => "Java JDK",
            ToolId::Editor => "VS Code",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ToolId::Toolchain => write!(f, "toolchain"),
            ToolId::Runtime => write!(f, "runtime"),
            ToolId::Jdk => write!(f, "jdk"),
            ToolId::Editor => write!(f, "editor"),
        }
    }
}

/// How a downloaded artifact becomes an installation.
///
/// Argument lists may use two placeholders which are substituted right before
/// the process is launched:
/// * `{artifact}` - absolute path of the downloaded file
/// * `{install_dir}` - absolute path of the tool's install directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InstallMethod {
    /// Unpack the artifact in-process (`.zip`, `.tar.gz`, `.tgz`, `.tar.xz`, `.tar.bz2`, `.tar`).
    Archive,
    /// Execute the artifact itself with arguments that suppress every prompt.
    Installer {
        #[serde(default)]
        args: Vec<String>,
    },
    /// Run the extractor provided by the tool's prerequisite (e.g. 7-Zip) on the artifact.
    ExternalExtract {
        #[serde(default)]
        args: Vec<String>,
    },
}

/// A shared, system-wide helper program a tool needs before it can be installed.
/// Only the toolchain has one by default: the 7-Zip archiver on Windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteSpec {
    /// Display name, e.g. "7-Zip".
    pub name: String,
    /// Where to download the prerequisite from when it is missing.
    pub url: String,
    /// File name used inside the working directory.
    pub artifact_name: String,
    /// Directory under the install root the prerequisite is placed in.
    pub install_dir: String,
    /// How the prerequisite itself is installed.
    pub method: InstallMethod,
    /// Executable path, relative to `install_dir`.
    pub executable: String,
    /// Absolute locations that already satisfy the prerequisite (e.g. a system-wide install).
    #[serde(default)]
    pub system_paths: Vec<String>,
}

/// Static recipe for installing one tool.
/// Built from compiled-in defaults and optionally replaced from `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSpec {
    /// Artifact download URL.
    pub url: String,
    /// File name inside the working directory. Unique per tool so parallel
    /// downloads never collide.
    pub artifact_name: String,
    /// Optional lowercase hex SHA-256 of the artifact.
    #[serde(default)]
    pub sha256: Option<String>,
    /// Directory under the install root owned by this tool.
    pub install_dir: String,
    pub method: InstallMethod,
    /// Glob (`*` wildcard only) matching a version-dependent top-level
    /// directory inside `install_dir`, e.g. `jdk*`.
    #[serde(default)]
    pub root_pattern: Option<String>,
    /// Files, relative to the resolved install root, that must exist afterwards.
    pub markers: Vec<String>,
    /// Directories, relative to the resolved install root, appended to PATH.
    /// An empty string stands for the root itself.
    #[serde(default)]
    pub path_entries: Vec<String>,
    #[serde(default)]
    pub prerequisite: Option<PrerequisiteSpec>,
}

/// Final result of one tool's install routine.
/// Created once by the installer and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub tool: ToolId,
    pub succeeded: bool,
    pub resolved_install_path: Option<PathBuf>,
    pub message: Option<String>,
    /// Set when the tool is installed but the environment could not be updated.
    pub warning: Option<String>,
}

impl InstallOutcome {
    pub fn installed(tool: ToolId, path: PathBuf) -> Self {
        InstallOutcome {
            tool,
            succeeded: true,
            resolved_install_path: Some(path),
            message: None,
            warning: None,
        }
    }

    /// The tool is on disk, but a fresh shell will not find it.
    pub fn installed_with_warning(tool: ToolId, path: PathBuf, warning: impl Into<String>) -> Self {
        InstallOutcome {
            warning: Some(warning.into()),
            ..InstallOutcome::installed(tool, path)
        }
    }

    pub fn failed(tool: ToolId, message: impl Into<String>) -> Self {
        InstallOutcome {
            tool,
            succeeded: false,
            resolved_install_path: None,
            message: Some(message.into()),
            warning: None,
        }
    }
}
