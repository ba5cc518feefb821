//! # Install Orchestrator
//!
//! Drives one run over a `Selection`:
//!
//! * **Sequential** - one tool after another on the calling thread. Every stage
//!   change is forwarded to the observer through an attached `ProgressTracker`.
//! * **Concurrent** - one named worker thread per tool. Workers keep their
//!   fine-grained progress to themselves; the orchestrator polls the join
//!   handles every `poll_interval` and reports an `AggregateSnapshot`
//!   ("N of M completed") built purely from thread completion.
//!
//! Whatever the strategy, every selected tool ends up with exactly one
//! `InstallOutcome`, a failing or panicking installer never affects the others,
//! and the working directory is removed once every unit is finished.

use chrono::{DateTime, Local};
use colored::Colorize;
use std::any::Any;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::installers::{InstallContext, Installer, InstallerRegistry};
use crate::libs::progress::{ProgressObserver, ProgressTracker, Spinner};
use crate::libs::selection::Selection;
use crate::libs::utilities::file_operations::remove_dir_best_effort;
use crate::libs::utilities::misc_utils::format_elapsed;
use crate::schemas::progress::{AggregateSnapshot, UnitState};
use crate::schemas::settings::Strategy;
use crate::schemas::tools::{InstallOutcome, ToolId};
use crate::{log_debug, log_error, log_info, log_warn};

/// Everything a finished run has to say.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One outcome per selected tool, in selection order.
    pub outcomes: Vec<InstallOutcome>,
    pub elapsed: Duration,
    pub started_at: DateTime<Local>,
    pub cleanup_attempted: bool,
    pub cleanup_ok: bool,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Plain-text summary, one line per tool.
    pub fn summary_lines(&self) -> Vec<String> {
        self.outcomes.iter().map(summary_line).collect()
    }

    pub fn print_summary(&self) {
        println!();
        println!(
            "{} (started {}, took {})",
            "Summary".bold(),
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            format_elapsed(self.elapsed)
        );
        for (outcome, line) in self.outcomes.iter().zip(self.summary_lines()) {
            if !outcome.succeeded {
                println!("  {}", line.red());
            } else if outcome.warning.is_some() {
                println!("  {}", line.yellow());
            } else {
                println!("  {}", line.green());
            }
        }
        if self.cleanup_attempted && !self.cleanup_ok {
            println!("  {}", "Downloaded files could not be removed completely.".yellow());
        }
        println!(
            "{} installed, {} failed",
            self.succeeded().to_string().green(),
            self.failed().to_string().red()
        );
    }
}

fn summary_line(outcome: &InstallOutcome) -> String {
    let name = outcome.tool.display_name();
    if !outcome.succeeded {
        return format!(
            "{}: FAILED: {}",
            name,
            outcome.message.as_deref().unwrap_or("unknown error")
        );
    }
    let path = outcome
        .resolved_install_path
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    match &outcome.warning {
        Some(warning) => format!("{}: installed at {} (warning: {})", name, path, warning),
        None => format!("{}: installed at {}", name, path),
    }
}

pub struct Orchestrator {
    registry: InstallerRegistry,
    context: Arc<InstallContext>,
    strategy: Strategy,
    poll_interval: Duration,
}

impl Orchestrator {
    pub fn new(
        registry: InstallerRegistry,
        context: Arc<InstallContext>,
        strategy: Strategy,
        poll_interval: Duration,
    ) -> Self {
        Orchestrator {
            registry,
            context,
            strategy,
            poll_interval,
        }
    }

    /// Installs every tool in `selection`. Never fails: problems end up in the
    /// individual outcomes of the returned report.
    pub fn run(&self, selection: &Selection, observer: &mut dyn ProgressObserver) -> RunReport {
        let started_at = Local::now();
        let started = Instant::now();
        log_info!(
            "[Devkit::Orchestrator] Installing {} tool(s) using the {} strategy",
            selection.len(),
            self.strategy.to_string().bold()
        );

        let outcomes = match self.strategy {
            Strategy::Sequential => self.run_sequential(selection, observer),
            Strategy::Concurrent => self.run_concurrent(selection, observer, started),
        };

        // Every unit is finished at this point, so nothing still reads the artifacts.
        let cleanup_ok = remove_dir_best_effort(&self.context.work_dir);

        RunReport {
            outcomes,
            elapsed: started.elapsed(),
            started_at,
            cleanup_attempted: true,
            cleanup_ok,
        }
    }

    fn installer_for(&self, tool: ToolId) -> Option<Arc<dyn Installer>> {
        let installer = self.registry.get(&tool).cloned();
        if installer.is_none() {
            log_error!("[Devkit::Orchestrator] No installer registered for {}", tool);
        }
        installer
    }

    fn run_sequential(&self, selection: &Selection, observer: &mut dyn ProgressObserver) -> Vec<InstallOutcome> {
        let total = selection.len();
        let mut outcomes = Vec::with_capacity(total);
        for (index, &tool) in selection.iter().enumerate() {
            observer.tool_started(index + 1, total, tool);
            let outcome = match self.installer_for(tool) {
                Some(installer) => {
                    let mut tracker = ProgressTracker::attached(tool, &mut *observer);
                    installer.install(&self.context, &mut tracker)
                }
                None => not_registered(tool),
            };
            observer.tool_finished(&outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    fn run_concurrent(
        &self,
        selection: &Selection,
        observer: &mut dyn ProgressObserver,
        started: Instant,
    ) -> Vec<InstallOutcome> {
        let mut units: Vec<Unit> = selection.iter().map(|&tool| Unit::queued(tool)).collect();
        let mut spinner = Spinner::default();
        if !units.is_empty() {
            observer.aggregate(&snapshot(&units, started, spinner.next_glyph()));
        }

        for unit in units.iter_mut() {
            self.start(unit);
            if let Some(outcome) = &unit.outcome {
                observer.tool_finished(outcome);
            }
        }

        loop {
            for unit in units.iter_mut() {
                if let Some(outcome) = unit.poll() {
                    observer.tool_finished(outcome);
                }
            }

            let current = snapshot(&units, started, spinner.next_glyph());
            observer.aggregate(&current);
            if current.is_done() {
                break;
            }
            thread::sleep(self.poll_interval);
        }

        units.into_iter().filter_map(Unit::into_outcome).collect()
    }

    /// Moves a queued unit to Running, or straight to Failed when no worker
    /// can be started for it.
    fn start(&self, unit: &mut Unit) {
        let tool = unit.tool;
        let Some(installer) = self.installer_for(tool) else {
            unit.outcome = Some(not_registered(tool));
            return;
        };
        let ctx = Arc::clone(&self.context);
        let spawned = thread::Builder::new()
            .name(format!("install-{}", tool))
            .spawn(move || installer.install(&ctx, &mut ProgressTracker::detached(tool)));
        match spawned {
            Ok(handle) => {
                log_debug!("[Devkit::Orchestrator] Worker for {} started", tool);
                unit.handle = Some(handle);
            }
            Err(e) => {
                log_error!("[Devkit::Orchestrator] Could not start a worker for {}: {}", tool, e);
                unit.outcome = Some(InstallOutcome::failed(tool, format!("could not start worker: {}", e)));
            }
        }
    }
}

fn snapshot(units: &[Unit], started: Instant, glyph: char) -> AggregateSnapshot {
    AggregateSnapshot {
        completed: units.iter().filter(|u| u.state().is_finished()).count(),
        total: units.len(),
        elapsed: started.elapsed(),
        glyph,
        units: units.iter().map(|u| (u.tool, u.state())).collect(),
    }
}

/// One tool under the concurrent strategy.
struct Unit {
    tool: ToolId,
    handle: Option<JoinHandle<InstallOutcome>>,
    outcome: Option<InstallOutcome>,
}

impl Unit {
    fn queued(tool: ToolId) -> Self {
        Unit {
            tool,
            handle: None,
            outcome: None,
        }
    }

    fn state(&self) -> UnitState {
        match &self.outcome {
            Some(outcome) if outcome.succeeded => UnitState::Completed,
            Some(_) => UnitState::Failed,
            None if self.handle.is_some() => UnitState::Running,
            None => UnitState::Queued,
        }
    }

    /// Joins the worker if it has finished. Returns the outcome the first time
    /// it becomes available.
    fn poll(&mut self) -> Option<&InstallOutcome> {
        if !self.handle.as_ref().is_some_and(JoinHandle::is_finished) {
            return None;
        }
        let handle = self.handle.take()?;
        let outcome = match handle.join() {
            Ok(outcome) => outcome,
            Err(payload) => {
                let reason = panic_message(&*payload);
                log_error!("[Devkit::Orchestrator] Installer for {} panicked: {}", self.tool, reason);
                InstallOutcome::failed(self.tool, format!("installer panicked: {}", reason))
            }
        };
        self.outcome = Some(outcome);
        self.outcome.as_ref()
    }

    fn into_outcome(self) -> Option<InstallOutcome> {
        if self.outcome.is_none() {
            log_warn!("[Devkit::Orchestrator] {} never reported an outcome", self.tool);
        }
        self.outcome
    }
}

fn not_registered(tool: ToolId) -> InstallOutcome {
    InstallOutcome::failed(tool, "no installer registered for this tool")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
