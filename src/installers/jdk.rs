// Java Development Kit installer.
//
// Temurin ships as an archive whose top-level folder carries the exact
// build number (`jdk-21.0.4+7`), so the recipe uses a root pattern to step
// into it. Besides the usual PATH entry, the JDK publishes JAVA_HOME pointing
// at that resolved root.

use std::path::Path;

use super::{InstallContext, Installer, add_path_entries};
use crate::libs::environment::EnvError;
use crate::schemas::tools::{InstallMethod, InstallSpec, ToolId};

/// Environment variable pointing at the JDK install root.
pub const JAVA_HOME: &str = "JAVA_HOME";

pub fn default_spec() -> InstallSpec {
    let (url, artifact_name, java) = if cfg!(windows) {
        (
            "https://github.com/adoptium/temurin21-binaries/releases/download/jdk-21.0.4%2B7/OpenJDK21U-jdk_x64_windows_hotspot_21.0.4_7.zip",
            "jdk-temurin.zip",
            "bin/java.exe",
        )
    } else {
        (
            "https://github.com/adoptium/temurin21-binaries/releases/download/jdk-21.0.4%2B7/OpenJDK21U-jdk_x64_linux_hotspot_21.0.4_7.tar.gz",
            "jdk-temurin.tar.gz",
            "bin/java",
        )
    };

    InstallSpec {
        url: url.to_string(),
        artifact_name: artifact_name.to_string(),
        sha256: None,
        install_dir: "jdk".to_string(),
        method: InstallMethod::Archive,
        root_pattern: Some("jdk*".to_string()),
        markers: vec![java.to_string()],
        path_entries: vec!["bin".to_string()],
        prerequisite: None,
    }
}

pub struct JdkInstaller {
    spec: InstallSpec,
}

impl JdkInstaller {
    pub fn new(spec: InstallSpec) -> Self {
        JdkInstaller { spec }
    }
}

impl Installer for JdkInstaller {
    fn tool(&self) -> ToolId {
        ToolId::Jdk
    }

    fn spec(&self) -> &InstallSpec {
        &self.spec
    }

    fn configure(&self, root: &Path, ctx: &InstallContext) -> Result<(), EnvError> {
        ctx.env.set_variable(JAVA_HOME, &root.to_string_lossy())?;
        add_path_entries(&self.spec.path_entries, root, ctx)
    }
}
