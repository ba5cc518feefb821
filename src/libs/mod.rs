// Core library: selection, environment, downloads, processes, progress and
// the orchestrator that ties them together.

// Selection text -> set of tools.
pub mod selection;
// PATH and variable persistence behind a single lock.
pub mod environment;
// Artifact downloads with timeout, retry and checksum verification.
pub mod fetch;
// Launching installers and extractors.
pub mod process;
// Per-tool progress, aggregate snapshots and console rendering.
pub mod progress;
// Sequential and concurrent scheduling, cleanup and the final report.
pub mod orchestrator;
// `config.yaml` loading.
pub mod config_loading;
pub mod utilities;

#[cfg(test)]
pub(crate) mod testing;
