use colored::Colorize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::libs::utilities::misc_utils::expand_tilde;
use crate::schemas::settings::Settings;
use crate::{log_debug, log_info};

/// Location used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "~/.setup-devkit/config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Resolves the config file location, expanding a leading `~`.
pub fn resolve_config_path(config: Option<&str>) -> PathBuf {
    expand_tilde(config.unwrap_or(DEFAULT_CONFIG_PATH))
}

/// Loads `Settings` from `config` (or the default location).
///
/// A file that does not exist is not an error: the built-in defaults are used.
/// A file that exists but cannot be read or parsed is, since silently ignoring
/// a user's overrides would install the wrong thing.
pub fn load_settings(config: Option<&str>) -> Result<Settings, ConfigError> {
    let path = resolve_config_path(config);
    log_debug!("[Devkit::Config] Loading configuration from {}", path.display());

    if !path.exists() {
        log_info!(
            "[Devkit::Config] No configuration at {}. Using built-in defaults.",
            path.display().to_string().yellow()
        );
        return Ok(Settings::default());
    }

    let settings = parse_settings_file(&path)?;
    log_debug!(
        "[Devkit::Config] Loaded configuration from {} ({} tool override(s))",
        path.display().to_string().green(),
        settings.tools.len()
    );
    Ok(settings)
}

fn parse_settings_file(path: &Path) -> Result<Settings, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    // An empty file deserializes to `null`, which we treat like an empty mapping.
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::settings::Strategy;
    use crate::schemas::tools::{InstallMethod, ToolId};

    fn write_config(contents: &str) -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, contents).unwrap();
        let path = path.display().to_string();
        (dir, path)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml").display().to_string();
        assert_eq!(load_settings(Some(&path)).unwrap(), Settings::default());
    }

    #[test]
    fn partial_overrides_keep_remaining_defaults() {
        let (_dir, path) = write_config(
            "strategy: concurrent\n\
             fetch_retries: 5\n\
             tools:\n  \
               jdk:\n    \
                 url: https://mirror.example/jdk.tar.gz\n    \
                 artifact_name: jdk.tar.gz\n    \
                 install_dir: jdk\n    \
                 method:\n      \
                   kind: archive\n    \
                 root_pattern: \"jdk*\"\n    \
                 markers: [bin/java]\n    \
                 path_entries: [bin]\n",
        );
        let settings = load_settings(Some(&path)).unwrap();

        assert_eq!(settings.strategy, Strategy::Concurrent);
        assert_eq!(settings.fetch_retries, 5);
        assert_eq!(settings.fetch_timeout_secs, 300);
        assert_eq!(settings.poll_interval_ms, 200);
        assert_eq!(settings.install_root, "~/.setup-devkit/tools");

        let jdk = &settings.tools[&ToolId::Jdk];
        assert_eq!(jdk.method, InstallMethod::Archive);
        assert_eq!(jdk.root_pattern.as_deref(), Some("jdk*"));
        assert_eq!(jdk.sha256, None);
        assert!(jdk.prerequisite.is_none());
    }

    #[test]
    fn installer_method_arguments_are_parsed() {
        let (_dir, path) = write_config(
            "tools:\n  \
               editor:\n    \
                 url: https://mirror.example/code.exe\n    \
                 artifact_name: code.exe\n    \
                 install_dir: vscode\n    \
                 method:\n      \
                   kind: installer\n      \
                   args: [\"/VERYSILENT\", \"/DIR={install_dir}\"]\n    \
                 markers: [Code.exe]\n",
        );
        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(
            settings.tools[&ToolId::Editor].method,
            InstallMethod::Installer {
                args: vec!["/VERYSILENT".into(), "/DIR={install_dir}".into()]
            }
        );
    }

    #[test]
    fn empty_file_yields_defaults() {
        let (_dir, path) = write_config("   \n");
        assert_eq!(load_settings(Some(&path)).unwrap(), Settings::default());
    }

    #[test]
    fn malformed_yaml_is_fatal() {
        let (_dir, path) = write_config("strategy: [not, a, strategy\n");
        assert!(matches!(load_settings(Some(&path)), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn unknown_tool_key_is_rejected() {
        let (_dir, path) = write_config("tools:\n  fortran: {}\n");
        assert!(matches!(load_settings(Some(&path)), Err(ConfigError::Parse { .. })));
    }
}
