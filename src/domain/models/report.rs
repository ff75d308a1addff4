//! Run report model.
//!
//! The terminal summary of a run: one disposition per task plus aggregate
//! counts. This is the engine's primary output surface.

use serde::{Deserialize, Serialize};

/// Why a run stopped before exhausting its waves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum HaltReason {
    /// A task failed; subsequent waves were not started.
    CascadeStop {
        /// Ids of the tasks that failed.
        failed: Vec<String>,
    },
    /// No task was ready while unterminated tasks remained.
    Deadlock {
        /// Ids of the tasks that could never become ready.
        remaining: Vec<String>,
    },
}

/// Terminal disposition of a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Disposition {
    /// Verification passed.
    Completed {
        /// Final verification score.
        score: u8,
        /// Worker invocations used.
        attempts: u32,
    },
    /// Retries exhausted or capability fault.
    Failed {
        /// Human-readable failure reason.
        reason: String,
        /// Last verification score, when one was recorded.
        score: Option<u8>,
        /// Worker invocations used.
        attempts: u32,
    },
    /// Never started because the run halted first.
    Skipped {
        /// Why the task never ran.
        reason: String,
    },
}

impl Disposition {
    /// Short status label for tables and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
        }
    }
}

/// Per-task row in the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReport {
    /// Run-qualified task id.
    pub task_id: String,
    /// Id as written in the plan.
    pub plan_id: String,
    /// Task title.
    pub title: String,
    /// Terminal disposition.
    pub disposition: Disposition,
    /// Final verifier feedback, when the task was verified at least once.
    pub feedback: Option<String>,
}

/// Terminal summary of one engine run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identifier used to qualify task ids.
    pub run_id: String,
    /// Number of tasks in the plan.
    pub total: usize,
    /// Tasks that completed.
    pub completed: usize,
    /// Tasks that failed.
    pub failed: usize,
    /// Tasks that never started.
    pub skipped: usize,
    /// Waves executed.
    pub waves: usize,
    /// Wall-clock duration of the run in seconds.
    pub duration_secs: u64,
    /// Why the run halted early, if it did.
    pub halt: Option<HaltReason>,
    /// Per-task rows in plan order.
    pub tasks: Vec<TaskReport>,
}

impl RunReport {
    /// Whether every task completed.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }
}
