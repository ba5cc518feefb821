// Progress data shared between the installers, the orchestrator and the reporter.

use std::time::Duration;

use crate::schemas::tools::ToolId;

/// Milestones of a single tool install. Each one maps to a fixed percentage;
/// the order of the variants is the order they are reached in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Pending,
    Downloading,
    Preparing,
    Installing,
    Extracting,
    Verifying,
    Configuring,
    Succeeded,
    Failed,
}

impl Stage {
    pub fn percent(self) -> u8 {
        match self {
            Stage::Pending => 0,
            Stage::Downloading => 10,
            Stage::Preparing => 20,
            Stage::Installing => 30,
            Stage::Extracting => 70,
            Stage::Verifying => 90,
            Stage::Configuring => 95,
            Stage::Succeeded | Stage::Failed => 100,
        }
    }
}

/// Fine-grained progress of one tool. Only the thread running that tool writes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressState {
    /// Activity label, the tool's display name.
    pub label: String,
    pub stage: Stage,
    pub status: String,
    /// Always in `0..=100` and never decreasing.
    pub percent: u8,
}

impl ProgressState {
    pub fn new(tool: ToolId) -> Self {
        ProgressState {
            label: tool.display_name().to_string(),
            stage: Stage::Pending,
            status: "Pending".to_string(),
            percent: 0,
        }
    }

    /// Moves to `stage`. The percentage only ever goes up, so a late or
    /// repeated milestone cannot make the bar jump backwards.
    pub fn advance(&mut self, stage: Stage, status: impl Into<String>) {
        self.stage = stage;
        self.status = status.into();
        self.percent = self.percent.max(stage.percent()).min(100);
    }
}

/// Lifecycle of one unit of work under the concurrent strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl UnitState {
    pub fn is_finished(self) -> bool {
        matches!(self, UnitState::Completed | UnitState::Failed)
    }
}

/// Coarse "N of M completed" view rendered while workers run in parallel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSnapshot {
    pub completed: usize,
    pub total: usize,
    pub elapsed: Duration,
    /// Liveness indicator, rotated on every poll.
    pub glyph: char,
    pub units: Vec<(ToolId, UnitState)>,
}

impl AggregateSnapshot {
    pub fn is_done(&self) -> bool {
        self.completed == self.total
    }
}
