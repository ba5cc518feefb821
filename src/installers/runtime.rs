// Python runtime installer.
//
// Windows: the official python.org installer run with `/quiet` into our own
// directory (no system PATH changes by the installer itself; we manage PATH).
// Elsewhere: a relocatable python-build-standalone archive.

use super::Installer;
use crate::schemas::tools::{InstallMethod, InstallSpec, ToolId};

pub fn default_spec() -> InstallSpec {
    if cfg!(windows) {
        InstallSpec {
            url: "https://www.python.org/ftp/python/3.12.6/python-3.12.6-amd64.exe".to_string(),
            artifact_name: "runtime-python-installer.exe".to_string(),
            sha256: None,
            install_dir: "python".to_string(),
            method: InstallMethod::Installer {
                args: vec![
                    "/quiet".to_string(),
                    "InstallAllUsers=0".to_string(),
                    "PrependPath=0".to_string(),
                    "Include_test=0".to_string(),
                    "TargetDir={install_dir}".to_string(),
                ],
            },
            root_pattern: None,
            markers: vec!["python.exe".to_string()],
            // Root holds python.exe, Scripts holds pip.
            path_entries: vec![String::new(), "Scripts".to_string()],
            prerequisite: None,
        }
    } else {
        InstallSpec {
            url: "https://github.com/indygreg/python-build-standalone/releases/download/20240909/cpython-3.12.6+20240909-x86_64-unknown-linux-gnu-install_only.tar.gz".to_string(),
            artifact_name: "runtime-python.tar.gz".to_string(),
            sha256: None,
            install_dir: "python".to_string(),
            method: InstallMethod::Archive,
            root_pattern: Some("python*".to_string()),
            markers: vec!["bin/python3".to_string()],
            path_entries: vec!["bin".to_string()],
            prerequisite: None,
        }
    }
}

pub struct RuntimeInstaller {
    spec: InstallSpec,
}

impl RuntimeInstaller {
    pub fn new(spec: InstallSpec) -> Self {
        RuntimeInstaller { spec }
    }
}

impl Installer for RuntimeInstaller {
    fn tool(&self) -> ToolId {
        ToolId::Runtime
    }

    fn spec(&self) -> &InstallSpec {
        &self.spec
    }
}
