// Launching third-party installers and extractors.

use colored::Colorize;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::log_debug;

/// Runs `program` with `args`, waits for it to exit and returns its exit code.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, program: &Path, args: &[String]) -> io::Result<i32>;
}

/// Spawns real processes through `std::process::Command`.
/// Output is discarded; installers are expected to run silently.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[String]) -> io::Result<i32> {
        log_debug!(
            "[Devkit::Process] Running {} {}",
            program.display().to_string().cyan(),
            args.join(" ").dimmed()
        );
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        // `None` means the process was killed by a signal.
        Ok(status.code().unwrap_or(-1))
    }
}

/// Substitutes `{artifact}` and `{install_dir}` in an argument template.
pub fn expand_args(template: &[String], artifact: &Path, install_dir: &Path) -> Vec<String> {
    let artifact = artifact.to_string_lossy();
    let install_dir = install_dir.to_string_lossy();
    template
        .iter()
        .map(|arg| {
            arg.replace("{artifact}", &artifact)
                .replace("{install_dir}", &install_dir)
        })
        .collect()
}
