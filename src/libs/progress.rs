// Progress reporting.
//
// Sequential runs report every stage of every tool through a `ProgressTracker`
// attached to an observer. Concurrent runs give each worker a detached tracker
// (its state stays private to the worker) and the orchestrator reports only an
// aggregate `AggregateSnapshot` built from thread completion.

use colored::Colorize;
use std::io::Write;

use crate::libs::utilities::misc_utils::format_elapsed;
use crate::log_debug;
use crate::schemas::progress::{AggregateSnapshot, ProgressState, Stage};
use crate::schemas::tools::{InstallOutcome, ToolId};

/// Receives progress events from the orchestrator.
pub trait ProgressObserver {
    /// A sequential run is starting tool `position` (1-based) of `total`.
    fn tool_started(&mut self, _position: usize, _total: usize, _tool: ToolId) {}
    /// A tool moved to a new stage. Only emitted under the sequential strategy.
    fn stage_changed(&mut self, _tool: ToolId, _state: &ProgressState) {}
    fn tool_finished(&mut self, _outcome: &InstallOutcome) {}
    /// Periodic "N of M completed" poll. Only emitted under the concurrent strategy.
    fn aggregate(&mut self, _snapshot: &AggregateSnapshot) {}
}

/// Per-tool progress handle passed to an installer.
pub struct ProgressTracker<'a> {
    tool: ToolId,
    state: ProgressState,
    observer: Option<&'a mut dyn ProgressObserver>,
}

impl ProgressTracker<'static> {
    /// Tracker whose state never leaves the worker that owns it.
    pub fn detached(tool: ToolId) -> Self {
        ProgressTracker {
            tool,
            state: ProgressState::new(tool),
            observer: None,
        }
    }
}

impl<'a> ProgressTracker<'a> {
    /// Tracker that forwards every stage change to `observer`.
    pub fn attached(tool: ToolId, observer: &'a mut dyn ProgressObserver) -> Self {
        ProgressTracker {
            tool,
            state: ProgressState::new(tool),
            observer: Some(observer),
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn advance(&mut self, stage: Stage, status: impl Into<String>) {
        self.state.advance(stage, status);
        log_debug!(
            "[Devkit::Progress] {} {}% {}",
            self.tool,
            self.state.percent,
            self.state.status
        );
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.stage_changed(self.tool, &self.state);
        }
    }
}

/// Rotating liveness glyph for the concurrent display.
#[derive(Debug, Default)]
pub struct Spinner {
    tick: usize,
}

impl Spinner {
    const FRAMES: [char; 4] = ['|', '/', '-', '\\'];

    /// Returns the current frame and moves to the next one.
    pub fn next_glyph(&mut self) -> char {
        let glyph = Self::FRAMES[self.tick % Self::FRAMES.len()];
        self.tick = self.tick.wrapping_add(1);
        glyph
    }
}

/// Renders progress to stderr.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    /// Whether the last thing written was an in-place aggregate line.
    inline_active: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn end_inline(&mut self) {
        if self.inline_active {
            eprintln!();
            self.inline_active = false;
        }
    }
}

/// `[#####-----]` style bar, ten cells wide.
pub fn render_bar(percent: u8) -> String {
    let filled = (percent.min(100) as usize) / 10;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(10 - filled))
}

/// Single-line text for an aggregate snapshot.
pub fn render_aggregate(snapshot: &AggregateSnapshot) -> String {
    format!(
        "{} {} of {} completed (elapsed {})",
        snapshot.glyph,
        snapshot.completed,
        snapshot.total,
        format_elapsed(snapshot.elapsed)
    )
}

impl ProgressObserver for ConsoleReporter {
    fn tool_started(&mut self, position: usize, total: usize, tool: ToolId) {
        self.end_inline();
        eprintln!(
            "{} {}",
            format!("[{}/{}]", position, total).bright_blue().bold(),
            tool.display_name().bold()
        );
    }

    fn stage_changed(&mut self, _tool: ToolId, state: &ProgressState) {
        let line = format!("    {} {:>3}% {}", render_bar(state.percent), state.percent, state.status);
        match state.stage {
            Stage::Failed => eprintln!("{}", line.red()),
            Stage::Succeeded => eprintln!("{}", line.green()),
            _ => eprintln!("{}", line),
        }
    }

    fn tool_finished(&mut self, outcome: &InstallOutcome) {
        self.end_inline();
        if let Some(warning) = &outcome.warning {
            eprintln!("    {} {}", "warning:".yellow(), warning);
        }
    }

    fn aggregate(&mut self, snapshot: &AggregateSnapshot) {
        eprint!("\r{}", render_aggregate(snapshot).cyan());
        let _ = std::io::stderr().flush();
        self.inline_active = true;
        if snapshot.is_done() {
            self.end_inline();
        }
    }
}
