// Structure of `~/.setup-devkit/config.yaml`.
// Every field has a default so an absent file, or a file that only sets a
// couple of keys, still yields a complete configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::schemas::tools::{InstallSpec, ToolId};

/// Scheduling strategy used by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One tool after another with per-stage percentages.
    #[default]
    Sequential,
    /// One worker thread per tool with an aggregate "N of M" display.
    Concurrent,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Strategy::Sequential => write!(f, "sequential"),
            Strategy::Concurrent => write!(f, "concurrent"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base directory; every tool gets its own subdirectory in here.
    pub install_root: String,
    /// Scratch directory for downloads. Removed at the end of every run.
    pub work_dir: String,
    /// Managed shell profile holding PATH and JAVA_HOME.
    pub env_file: String,
    pub strategy: Strategy,
    pub fetch_timeout_secs: u64,
    /// Additional attempts after the first failed download.
    pub fetch_retries: u32,
    /// Backoff unit; attempt `n` waits `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,
    pub poll_interval_ms: u64,
    /// Full replacements for the built-in install recipes.
    pub tools: HashMap<ToolId, InstallSpec>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            install_root: "~/.setup-devkit/tools".to_string(),
            work_dir: "~/.setup-devkit/downloads".to_string(),
            env_file: "~/.setup-devkit/env.sh".to_string(),
            strategy: Strategy::Sequential,
            fetch_timeout_secs: 300,
            fetch_retries: 2,
            retry_backoff_ms: 1000,
            poll_interval_ms: 200,
            tools: HashMap::new(),
        }
    }
}

impl Settings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
