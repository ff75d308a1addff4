//! Incremental engine events for live progress display.
//!
//! The engine emits these over an mpsc channel; the host adapter decides how
//! to render them. Sends are best-effort: a closed or full channel never
//! affects execution.

use serde::{Deserialize, Serialize};

/// One engine progress event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Execution started.
    RunStarted {
        /// Run identifier.
        run_id: String,
        /// Number of tasks in the plan.
        total: usize,
    },
    /// A wave of ready tasks is starting.
    WaveStarted {
        /// 1-based wave number.
        wave: usize,
        /// Tasks in the wave.
        task_count: usize,
    },
    /// First worker attempt for a task started.
    TaskStarted {
        /// Run-qualified task id.
        task_id: String,
        /// Task title.
        title: String,
    },
    /// Worker output handed to the verifier.
    TaskVerifying {
        /// Run-qualified task id.
        task_id: String,
        /// Attempt under verification.
        attempt: u32,
    },
    /// Verification failed with retries remaining; another attempt follows.
    TaskRetrying {
        /// Run-qualified task id.
        task_id: String,
        /// The attempt about to start.
        attempt: u32,
        /// Total attempts allowed.
        max_attempts: u32,
        /// Score of the rejected attempt.
        score: u8,
    },
    /// Task reached `Completed`.
    TaskCompleted {
        /// Run-qualified task id.
        task_id: String,
        /// Final verification score.
        score: u8,
        /// Worker invocations used.
        attempts: u32,
    },
    /// Task reached `Failed`.
    TaskFailed {
        /// Run-qualified task id.
        task_id: String,
        /// Failure reason.
        reason: String,
        /// Worker invocations used.
        attempts: u32,
    },
    /// All tasks in a wave reached a terminal state.
    WaveCompleted {
        /// 1-based wave number.
        wave: usize,
        /// Tasks that completed.
        succeeded: usize,
        /// Tasks that failed.
        failed: usize,
    },
    /// The run reached its terminal report.
    RunCompleted {
        /// Tasks that completed.
        completed: usize,
        /// Tasks that failed.
        failed: usize,
        /// Tasks that never started.
        skipped: usize,
    },
}

impl EngineEvent {
    /// Render the event as a status line plus a done flag, the shape host
    /// adapters display.
    pub fn status_line(&self) -> (String, bool) {
        match self {
            Self::RunStarted { run_id, total } => {
                (format!("Run {run_id}: executing {total} task(s)"), false)
            }
            Self::WaveStarted { wave, task_count } => {
                (format!("Wave {wave}: {task_count} task(s) in parallel"), false)
            }
            Self::TaskStarted { task_id, title } => {
                (format!("Executing {task_id}: {title}"), false)
            }
            Self::TaskVerifying { task_id, attempt } => {
                (format!("Verifying {task_id} (attempt {attempt})"), false)
            }
            Self::TaskRetrying {
                task_id,
                attempt,
                max_attempts,
                score,
            } => (
                format!("Retrying {task_id}: attempt {attempt}/{max_attempts} after score {score}/100"),
                false,
            ),
            Self::TaskCompleted {
                task_id,
                score,
                attempts,
            } => (
                format!("Completed {task_id}: score {score}/100 in {attempts} attempt(s)"),
                false,
            ),
            Self::TaskFailed {
                task_id, reason, ..
            } => (format!("Failed {task_id}: {reason}"), false),
            Self::WaveCompleted {
                wave,
                succeeded,
                failed,
            } => (
                format!("Wave {wave} finished: {succeeded} succeeded, {failed} failed"),
                false,
            ),
            Self::RunCompleted {
                completed,
                failed,
                skipped,
            } => (
                format!("Run finished: {completed} completed, {failed} failed, {skipped} skipped"),
                true,
            ),
        }
    }
}
