// Environment store and PATH mutation.
//
// Installers never touch the machine's environment directly. They go through
// `EnvMutator`, which serializes every read-modify-write of the store behind a
// single lock so that parallel installs appending different directories
// cannot overwrite each other's update.

use colored::Colorize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::{log_debug, log_info};

/// Name of the search path variable.
pub const PATH_VAR: &str = "PATH";

/// Separator between PATH entries on this platform.
pub const PATH_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("failed to access environment store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("environment store unavailable: {0}")]
    Unavailable(String),
}

/// Read/write access to a persistent set of environment variables.
pub trait EnvironmentStore: Send + Sync {
    fn read(&self, name: &str) -> Result<Option<String>, EnvError>;
    fn write(&self, name: &str, value: &str) -> Result<(), EnvError>;
}

/// In-memory store. Used by `--dry-run` and by tests.
#[derive(Debug, Default)]
pub struct MemoryEnvStore {
    vars: Mutex<HashMap<String, String>>,
}

impl MemoryEnvStore {
    #[cfg(test)]
    pub fn with_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        MemoryEnvStore {
            vars: Mutex::new(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    fn vars(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.vars.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EnvironmentStore for MemoryEnvStore {
    fn read(&self, name: &str) -> Result<Option<String>, EnvError> {
        Ok(self.vars().get(name).cloned())
    }

    fn write(&self, name: &str, value: &str) -> Result<(), EnvError> {
        self.vars().insert(name.to_string(), value.to_string());
        Ok(())
    }
}

/// Durable store backed by a managed shell profile, e.g. `~/.setup-devkit/env.sh`.
///
/// Each variable is one `export NAME="value" # setup-devkit` line. PATH holds
/// only the directories this tool manages and is written as
/// `export PATH="<managed>:$PATH"` so a sourcing shell keeps its own entries.
/// Lines without the trailing marker belong to the user and are never touched.
#[derive(Debug, Clone)]
pub struct ProfileEnvStore {
    path: PathBuf,
}

/// Trailing comment identifying the lines this store owns.
const MANAGED_MARKER: &str = "# setup-devkit";

impl ProfileEnvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ProfileEnvStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_lines(&self) -> Result<Vec<String>, EnvError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(EnvError::Io { path: self.path.clone(), source }),
        }
    }

    fn io_error(&self, source: io::Error) -> EnvError {
        EnvError::Io { path: self.path.clone(), source }
    }
}

/// Suffix appended to the managed PATH value so existing entries survive.
fn path_suffix() -> String {
    format!("{}$PATH", PATH_SEPARATOR)
}

/// Backslash-escapes every character a POSIX shell interprets inside double quotes.
fn escape_double_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn unescape_double_quoted(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => unescaped.extend(chars.next()),
            _ => unescaped.push(c),
        }
    }
    unescaped
}

fn render_export(name: &str, value: &str) -> String {
    let escaped = escape_double_quoted(value);
    if name == PATH_VAR {
        format!("export {}=\"{}{}\" {}", name, escaped, path_suffix(), MANAGED_MARKER)
    } else {
        format!("export {}=\"{}\" {}", name, escaped, MANAGED_MARKER)
    }
}

/// Returns the value of `name` if `line` is one of our managed export lines.
fn parse_export(line: &str, name: &str) -> Option<String> {
    let rest = line
        .trim()
        .strip_suffix(MANAGED_MARKER)?
        .trim_end()
        .strip_prefix("export ")?
        .strip_prefix(name)?
        .strip_prefix('=')?;
    let quoted = rest.strip_prefix('"')?.strip_suffix('"')?;
    let quoted = if name == PATH_VAR {
        quoted.strip_suffix(path_suffix().as_str()).unwrap_or(quoted)
    } else {
        quoted
    };
    Some(unescape_double_quoted(quoted))
}

impl EnvironmentStore for ProfileEnvStore {
    fn read(&self, name: &str) -> Result<Option<String>, EnvError> {
        Ok(self
            .read_lines()?
            .iter()
            .find_map(|line| parse_export(line, name)))
    }

    fn write(&self, name: &str, value: &str) -> Result<(), EnvError> {
        let mut lines = self.read_lines()?;
        let rendered = render_export(name, value);

        match lines.iter_mut().find(|line| parse_export(line, name).is_some()) {
            Some(existing) => *existing = rendered,
            None => {
                if lines.is_empty() {
                    lines.push("# Managed by setup-devkit. Source this file from your shell profile.".to_string());
                }
                lines.push(rendered);
            }
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let mut content = lines.join("\n");
        content.push('\n');
        fs::write(&self.path, content).map_err(|e| self.io_error(e))?;
        log_debug!(
            "[Devkit::Env] Wrote {} to {}",
            name.cyan(),
            self.path.display().to_string().yellow()
        );
        Ok(())
    }
}

/// Durable store for the per-user environment on Windows (`HKCU\Environment`).
///
/// Reads and writes go through PowerShell's `[Environment]` API with the
/// `User` target, which also notifies running programs of the change. Names
/// and values travel to the child process as environment variables, never as
/// part of the script text.
#[derive(Debug, Clone)]
pub struct UserEnvStore {
    shell: PathBuf,
}

impl Default for UserEnvStore {
    fn default() -> Self {
        UserEnvStore::with_shell("powershell")
    }
}

impl UserEnvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `shell` instead of `powershell` from PATH.
    pub fn with_shell(shell: impl Into<PathBuf>) -> Self {
        UserEnvStore { shell: shell.into() }
    }

    fn invoke(&self, script: &str, name: &str, value: &str) -> Result<String, EnvError> {
        let output = Command::new(&self.shell)
            .args(["-NoProfile", "-NonInteractive", "-Command", script])
            .env("DEVKIT_ENV_NAME", name)
            .env("DEVKIT_ENV_VALUE", value)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| EnvError::Io {
                path: self.shell.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(EnvError::Unavailable(format!(
                "{} exited with {}: {}",
                self.shell.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl EnvironmentStore for UserEnvStore {
    fn read(&self, name: &str) -> Result<Option<String>, EnvError> {
        let value = self.invoke(
            "[Console]::Out.Write([Environment]::GetEnvironmentVariable($env:DEVKIT_ENV_NAME, 'User'))",
            name,
            "",
        )?;
        Ok(Some(value).filter(|v| !v.is_empty()))
    }

    fn write(&self, name: &str, value: &str) -> Result<(), EnvError> {
        self.invoke(
            "[Environment]::SetEnvironmentVariable($env:DEVKIT_ENV_NAME, $env:DEVKIT_ENV_VALUE, 'User')",
            name,
            value,
        )?;
        log_debug!("[Devkit::Env] Wrote {} to the user environment", name.cyan());
        Ok(())
    }
}

/// Serialized access to an `EnvironmentStore`.
///
/// One instance is shared by all installer workers of a run; the lock covers
/// the whole read-check-write cycle.
pub struct EnvMutator {
    store: Arc<dyn EnvironmentStore>,
    lock: Mutex<()>,
}

impl EnvMutator {
    pub fn new(store: Arc<dyn EnvironmentStore>) -> Self {
        EnvMutator { store, lock: Mutex::new(()) }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // A panicking installer must not make PATH updates impossible for the others.
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends `directory` to PATH unless the current value already contains it.
    ///
    /// Containment is a plain substring check on the stored value.
    /// Returns `Ok(true)` when the value was changed.
    pub fn add_to_path(&self, directory: &Path) -> Result<bool, EnvError> {
        let directory = directory.to_string_lossy();
        let _guard = self.guard();

        let current = self.store.read(PATH_VAR)?.unwrap_or_default();
        if current.contains(directory.as_ref()) {
            log_debug!("[Devkit::Env] {} already on PATH", directory);
            return Ok(false);
        }

        let updated = if current.is_empty() {
            directory.to_string()
        } else if current.ends_with(PATH_SEPARATOR) {
            format!("{}{}", current, directory)
        } else {
            format!("{}{}{}", current, PATH_SEPARATOR, directory)
        };
        self.store.write(PATH_VAR, &updated)?;
        log_info!("[Devkit::Env] Added {} to PATH", directory.green());
        Ok(true)
    }

    /// Sets `name` to `value`, replacing any previous value.
    pub fn set_variable(&self, name: &str, value: &str) -> Result<(), EnvError> {
        let _guard = self.guard();
        self.store.write(name, value)?;
        log_info!("[Devkit::Env] Set {}={}", name.cyan(), value.green());
        Ok(())
    }

    pub fn read(&self, name: &str) -> Result<Option<String>, EnvError> {
        let _guard = self.guard();
        self.store.read(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::testing::SlowStore;
    use std::thread;

    fn path_of(mutator: &EnvMutator) -> String {
        mutator.read(PATH_VAR).unwrap().unwrap_or_default()
    }

    #[test]
    fn add_to_path_is_idempotent() {
        let initial = format!("/usr/bin{}/bin", PATH_SEPARATOR);
        let once = EnvMutator::new(Arc::new(MemoryEnvStore::with_vars([(PATH_VAR, initial.clone())])));
        let twice = EnvMutator::new(Arc::new(MemoryEnvStore::with_vars([(PATH_VAR, initial)])));

        assert!(once.add_to_path(Path::new("/opt/jdk/bin")).unwrap());
        assert!(twice.add_to_path(Path::new("/opt/jdk/bin")).unwrap());
        assert!(!twice.add_to_path(Path::new("/opt/jdk/bin")).unwrap());

        assert_eq!(path_of(&once), path_of(&twice));
        assert_eq!(path_of(&once).matches("/opt/jdk/bin").count(), 1);
    }

    #[test]
    fn add_to_path_handles_empty_and_trailing_separator() {
        let mutator = EnvMutator::new(Arc::new(MemoryEnvStore::default()));
        mutator.add_to_path(Path::new("/a")).unwrap();
        assert_eq!(path_of(&mutator), "/a");

        let trailing = format!("/x{}", PATH_SEPARATOR);
        let mutator = EnvMutator::new(Arc::new(MemoryEnvStore::with_vars([(PATH_VAR, trailing)])));
        mutator.add_to_path(Path::new("/b")).unwrap();
        assert_eq!(path_of(&mutator), format!("/x{}/b", PATH_SEPARATOR));
    }

    #[test]
    fn concurrent_appends_do_not_lose_updates() {
        // The store sleeps between read and write so unsynchronized callers
        // would both read the "before" value.
        let store = Arc::new(SlowStore::new("/usr/bin"));
        let mutator = Arc::new(EnvMutator::new(store));

        let handles: Vec<_> = ["/tools/gcc/bin", "/tools/jdk/bin"]
            .into_iter()
            .map(|dir| {
                let mutator = Arc::clone(&mutator);
                thread::spawn(move || mutator.add_to_path(Path::new(dir)).unwrap())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }

        let path = path_of(&mutator);
        assert_eq!(path.matches("/tools/gcc/bin").count(), 1, "{path}");
        assert_eq!(path.matches("/tools/jdk/bin").count(), 1, "{path}");
        assert!(path.starts_with("/usr/bin"));
    }

    #[test]
    fn profile_store_round_trips_and_keeps_foreign_lines() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("env.sh");
        fs::write(&file, "alias ll='ls -la'\n").unwrap();
        let store = ProfileEnvStore::new(&file);

        assert_eq!(store.read(PATH_VAR).unwrap(), None);
        store.write(PATH_VAR, "/opt/a").unwrap();
        store.write("JAVA_HOME", "/opt/jdk \"21\"").unwrap();
        store.write(PATH_VAR, &format!("/opt/a{}/opt/b", PATH_SEPARATOR)).unwrap();

        assert_eq!(store.read(PATH_VAR).unwrap(), Some(format!("/opt/a{}/opt/b", PATH_SEPARATOR)));
        assert_eq!(store.read("JAVA_HOME").unwrap(), Some("/opt/jdk \"21\"".to_string()));

        let content = fs::read_to_string(&file).unwrap();
        assert!(content.starts_with("alias ll='ls -la'"));
        assert_eq!(content.matches("export PATH=").count(), 1);
        assert!(content.contains("$PATH\""));
    }

    #[test]
    fn profile_store_reports_unwritable_location() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let store = ProfileEnvStore::new(blocker.join("env.sh"));
        let mutator = EnvMutator::new(Arc::new(store));

        let err = mutator.add_to_path(Path::new("/opt/x")).unwrap_err();
        assert!(matches!(err, EnvError::Io { .. }));
    }

    #[test]
    fn profile_store_escapes_shell_metacharacters() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileEnvStore::new(dir.path().join("env.sh"));
        let tricky = "/opt/a$(echo INJECTED)b/`echo X`/\\\"q\"$HOME";

        store.write("JAVA_HOME", tricky).unwrap();
        store.write(PATH_VAR, "/opt/$dir/bin").unwrap();

        assert_eq!(store.read("JAVA_HOME").unwrap().as_deref(), Some(tricky));
        assert_eq!(store.read(PATH_VAR).unwrap().as_deref(), Some("/opt/$dir/bin"));
    }

    #[cfg(unix)]
    #[test]
    fn sourced_profile_yields_the_stored_values() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("env.sh");
        let store = ProfileEnvStore::new(&file);
        let java_home = "/opt/a$(echo INJECTED)b/`echo X`";
        store.write("JAVA_HOME", java_home).unwrap();
        store.write(PATH_VAR, "/opt/$x/bin").unwrap();

        let script = format!(
            ". '{}'; printf '%s\\n' \"$JAVA_HOME\" \"$PATH\"",
            file.display()
        );
        let output = Command::new("sh").args(["-c", &script]).output().unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();
        let mut lines = stdout.lines();
        assert_eq!(lines.next(), Some(java_home));
        assert!(lines.next().unwrap().starts_with("/opt/$x/bin:"));
    }

    #[test]
    fn user_written_exports_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("env.sh");
        fs::write(&file, "export PATH=\"/mine:$PATH\"\n").unwrap();
        let store = ProfileEnvStore::new(&file);

        assert_eq!(store.read(PATH_VAR).unwrap(), None);
        store.write(PATH_VAR, "/opt/jdk/bin").unwrap();

        let content = fs::read_to_string(&file).unwrap();
        assert!(content.starts_with("export PATH=\"/mine:$PATH\"\n"));
        assert_eq!(content.matches("export PATH=").count(), 2);
        assert_eq!(store.read(PATH_VAR).unwrap().as_deref(), Some("/opt/jdk/bin"));
    }

    #[test]
    fn user_store_without_a_shell_is_an_env_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserEnvStore::with_shell(dir.path().join("no-such-powershell"));
        let mutator = EnvMutator::new(Arc::new(store));

        let err = mutator.add_to_path(Path::new("C:\\tools\\bin")).unwrap_err();
        assert!(matches!(err, EnvError::Io { .. }));
    }

    #[cfg(windows)]
    #[test]
    fn user_store_round_trips_on_windows() {
        let store = UserEnvStore::new();
        let name = "SETUP_DEVKIT_TEST_VARIABLE";
        store.write(name, "C:\\Tools\\$weird `value`").unwrap();
        assert_eq!(store.read(name).unwrap().as_deref(), Some("C:\\Tools\\$weird `value`"));
        // An empty value removes the variable again.
        store.write(name, "").unwrap();
        assert_eq!(store.read(name).unwrap(), None);
    }
}
