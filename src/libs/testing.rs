// Test doubles shared by the unit tests of the installers, the environment
// mutator and the orchestrator.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

use crate::installers::InstallContext;
use crate::libs::environment::{EnvError, EnvMutator, EnvironmentStore, MemoryEnvStore};
use crate::libs::fetch::{FetchError, Fetcher};
use crate::libs::process::ProcessRunner;
use crate::libs::progress::ProgressObserver;
use crate::schemas::progress::{AggregateSnapshot, ProgressState};
use crate::schemas::tools::{InstallMethod, InstallOutcome, InstallSpec, ToolId};

/// A minimal spec installing into `<install_root>/test-tool`.
pub fn spec_with(method: InstallMethod) -> InstallSpec {
    InstallSpec {
        url: "https://example.invalid/test-tool".to_string(),
        artifact_name: "test-tool.bin".to_string(),
        sha256: None,
        install_dir: "test-tool".to_string(),
        method,
        root_pattern: None,
        markers: Vec::new(),
        path_entries: Vec::new(),
        prerequisite: None,
    }
}

/// Builds a `.tar.gz` holding one small file at `entry`.
pub fn tar_gz_with(entry: &str) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::fast());
    let mut builder = tar::Builder::new(encoder);
    let body = b"marker";
    let mut header = tar::Header::new_gnu();
    header.set_size(body.len() as u64);
    header.set_mode(0o755);
    header.set_cksum();
    builder.append_data(&mut header, entry, &body[..]).unwrap();
    builder.into_inner().unwrap().finish().unwrap()
}

/// Temporary install root and working directory.
pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        TestEnv {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn install_root(&self) -> PathBuf {
        self.dir.path().join("tools")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.dir.path().join("downloads")
    }

    pub fn context(&self, fetcher: MockFetcher, runner: MockRunner) -> InstallContext {
        self.context_with_store(fetcher, runner, Arc::new(MemoryEnvStore::default()))
    }

    pub fn context_with_failing_store(&self, fetcher: MockFetcher, runner: MockRunner) -> InstallContext {
        self.context_with_store(fetcher, runner, Arc::new(FailingStore))
    }

    pub fn context_with_store(
        &self,
        fetcher: MockFetcher,
        runner: MockRunner,
        store: Arc<dyn EnvironmentStore>,
    ) -> InstallContext {
        InstallContext::new(
            self.install_root(),
            self.work_dir(),
            Arc::new(fetcher),
            Arc::new(runner),
            EnvMutator::new(store),
        )
    }
}

#[derive(Clone)]
pub enum FetchBehavior {
    Bytes(Vec<u8>),
    Fail,
    /// Sleep, write a small file, then raise the flag just before returning.
    Delay(Duration, Arc<AtomicBool>),
}

/// Fetcher that never touches the network.
#[derive(Clone)]
pub struct MockFetcher {
    default: FetchBehavior,
    overrides: HashMap<String, FetchBehavior>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    fn with_default(default: FetchBehavior) -> Self {
        MockFetcher {
            default,
            overrides: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn ok() -> Self {
        Self::with_default(FetchBehavior::Bytes(b"artifact".to_vec()))
    }

    pub fn failing() -> Self {
        Self::with_default(FetchBehavior::Fail)
    }

    pub fn with_archive(entry: &str) -> Self {
        Self::with_default(FetchBehavior::Bytes(tar_gz_with(entry)))
    }

    pub fn on(mut self, url: &str, behavior: FetchBehavior) -> Self {
        self.overrides.insert(url.to_string(), behavior);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        let io_err = |source: io::Error| FetchError::Io {
            path: dest.display().to_string(),
            source,
        };
        match self.overrides.get(url).unwrap_or(&self.default) {
            FetchBehavior::Bytes(bytes) => fs::write(dest, bytes).map_err(io_err),
            FetchBehavior::Fail => Err(FetchError::Http {
                url: url.to_string(),
                reason: "simulated network failure".to_string(),
            }),
            FetchBehavior::Delay(delay, done) => {
                thread::sleep(*delay);
                fs::write(dest, b"slow artifact").map_err(io_err)?;
                done.store(true, Ordering::SeqCst);
                Ok(())
            }
        }
    }
}

/// Process runner that records invocations and optionally creates a file,
/// standing in for what a real installer would have written.
#[derive(Clone)]
pub struct MockRunner {
    exit_code: i32,
    creates: Vec<PathBuf>,
    calls: Arc<Mutex<Vec<(PathBuf, Vec<String>)>>>,
}

impl MockRunner {
    pub fn exiting(exit_code: i32) -> Self {
        MockRunner {
            exit_code,
            creates: Vec::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Succeeds and creates `path` (and its parents) on every run.
    pub fn creating(path: impl Into<PathBuf>) -> Self {
        MockRunner {
            creates: vec![path.into()],
            ..Self::exiting(0)
        }
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    pub fn also_creating(mut self, path: impl Into<PathBuf>) -> Self {
        self.creates.push(path.into());
        self
    }

    pub fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for MockRunner {
    fn run(&self, program: &Path, args: &[String]) -> io::Result<i32> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_path_buf(), args.to_vec()));
        for path in &self.creates {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, b"")?;
        }
        Ok(self.exit_code)
    }
}

/// Store whose writes always fail, as with a read-only profile.
pub struct FailingStore;

impl EnvironmentStore for FailingStore {
    fn read(&self, _name: &str) -> Result<Option<String>, EnvError> {
        Ok(None)
    }

    fn write(&self, _name: &str, _value: &str) -> Result<(), EnvError> {
        Err(EnvError::Unavailable("read-only test store".to_string()))
    }
}

/// In-memory store that pauses after every read. Without external
/// serialization two concurrent read-modify-write cycles would both observe
/// the same "before" value.
pub struct SlowStore {
    inner: MemoryEnvStore,
}

impl SlowStore {
    pub fn new(initial_path: &str) -> Self {
        SlowStore {
            inner: MemoryEnvStore::with_vars([("PATH", initial_path)]),
        }
    }
}

impl EnvironmentStore for SlowStore {
    fn read(&self, name: &str) -> Result<Option<String>, EnvError> {
        let value = self.inner.read(name)?;
        thread::sleep(Duration::from_millis(100));
        Ok(value)
    }

    fn write(&self, name: &str, value: &str) -> Result<(), EnvError> {
        self.inner.write(name, value)
    }
}

/// Observer that ignores everything.
pub struct NullObserver;

impl ProgressObserver for NullObserver {}

/// Observer that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingObserver {
    pub started: Vec<(usize, usize, ToolId)>,
    pub stages: Vec<(ToolId, ProgressState)>,
    pub finished: Vec<InstallOutcome>,
    /// Each snapshot together with the value of `watch` when it was taken.
    pub aggregates: Vec<(AggregateSnapshot, bool)>,
    pub watch: Option<Arc<AtomicBool>>,
}

impl RecordingObserver {
    pub fn watching(flag: Arc<AtomicBool>) -> Self {
        RecordingObserver {
            watch: Some(flag),
            ..Self::default()
        }
    }
}

impl ProgressObserver for RecordingObserver {
    fn tool_started(&mut self, position: usize, total: usize, tool: ToolId) {
        self.started.push((position, total, tool));
    }

    fn stage_changed(&mut self, tool: ToolId, state: &ProgressState) {
        self.stages.push((tool, state.clone()));
    }

    fn tool_finished(&mut self, outcome: &InstallOutcome) {
        self.finished.push(outcome.clone());
    }

    fn aggregate(&mut self, snapshot: &AggregateSnapshot) {
        let flag = self
            .watch
            .as_ref()
            .map(|f| f.load(Ordering::SeqCst))
            .unwrap_or(false);
        self.aggregates.push((snapshot.clone(), flag));
    }
}
