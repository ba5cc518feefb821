// Low-level helpers used by the installers and the orchestrator.

// Archive extraction (zip, tar.gz, tar.xz, tar).
pub mod compression;
// Directory creation/removal, marker checks and install-root discovery.
pub mod file_operations;
// Tilde expansion and duration formatting.
pub mod misc_utils;
