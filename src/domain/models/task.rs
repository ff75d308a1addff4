//! Task domain model.
//!
//! Tasks are discrete units of work parsed from a plan document. They form a
//! DAG through their dependency lists and move through a fixed lifecycle
//! driven by the task runner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::EngineError;

use super::verification::VerificationReport;

/// Status of a task in the execution pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is defined but dependencies not met.
    Pending,
    /// Dependencies met; scheduled into the current wave.
    Ready,
    /// Worker attempt in flight.
    Running,
    /// Worker output produced; verifier judging it.
    AwaitingVerification,
    /// Verification failed with retries remaining.
    Retrying,
    /// Verification passed. Terminal.
    Completed,
    /// Retries exhausted or capability fault. Terminal.
    Failed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl TaskStatus {
    /// Stable string form for logs and stored records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::AwaitingVerification => "awaiting_verification",
            Self::Retrying => "retrying",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse a status token, tolerating case.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "ready" => Some(Self::Ready),
            "running" => Some(Self::Running),
            "awaiting_verification" => Some(Self::AwaitingVerification),
            "retrying" => Some(Self::Retrying),
            "completed" | "complete" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(&self) -> Vec<TaskStatus> {
        match self {
            Self::Pending => vec![Self::Ready],
            Self::Ready => vec![Self::Running],
            Self::Running => vec![Self::AwaitingVerification, Self::Failed],
            Self::AwaitingVerification => vec![Self::Completed, Self::Retrying, Self::Failed],
            Self::Retrying => vec![Self::Running],
            Self::Completed | Self::Failed => vec![],
        }
    }

    /// Whether the lifecycle permits moving to `new_status` from here.
    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a task's append-only attempt history.
///
/// Records are pushed as attempts resolve and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based attempt number.
    pub attempt: u32,
    /// Worker output, when the worker produced one.
    pub output: Option<String>,
    /// Verification result, when the attempt reached the verifier.
    pub verification: Option<VerificationReport>,
    /// Capability error that ended the attempt, if any.
    pub error: Option<String>,
    /// When the record was appended.
    pub recorded_at: DateTime<Utc>,
}

impl AttemptRecord {
    /// Record an attempt that produced output and was verified.
    pub fn verified(attempt: u32, output: String, verification: VerificationReport) -> Self {
        Self {
            attempt,
            output: Some(output),
            verification: Some(verification),
            error: None,
            recorded_at: Utc::now(),
        }
    }

    /// Record an attempt cut short by a capability fault.
    pub fn errored(attempt: u32, output: Option<String>, error: String) -> Self {
        Self {
            attempt,
            output,
            verification: None,
            error: Some(error),
            recorded_at: Utc::now(),
        }
    }
}

/// A discrete unit of work parsed from a plan document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Run-scoped unique id. Equal to `plan_id` until the controller
    /// qualifies the task for a run.
    pub id: String,
    /// Id as written in the plan, kept for display.
    pub plan_id: String,
    /// Human-readable title.
    pub title: String,
    /// Work description handed to the worker, opaque to the scheduler.
    pub instructions: String,
    /// Ids of tasks that must complete before this one may start.
    pub dependencies: Vec<String>,
    /// Display batching hint. Never gates scheduling.
    pub concurrency_group: Option<i64>,
    /// Bound on verification-failure retries.
    pub max_retries: u32,
    /// Role descriptor for the worker capability.
    pub worker_role: String,
    /// Role descriptor for the verifier capability.
    pub verifier_role: String,
    /// Criteria text handed to the verifier.
    pub verification_spec: String,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Attempt counter; incremented before each worker invocation.
    pub attempt: u32,
    /// Append-only per-attempt outcomes.
    pub history: Vec<AttemptRecord>,
    /// When the task record was created.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Default retry bound when the plan does not specify one.
    pub const DEFAULT_MAX_RETRIES: u32 = 2;
    /// Default worker role descriptor.
    pub const DEFAULT_WORKER_ROLE: &'static str = "Worker agent";
    /// Default verifier role descriptor.
    pub const DEFAULT_VERIFIER_ROLE: &'static str = "QC agent";
    /// Default verification criteria.
    pub const DEFAULT_VERIFICATION_SPEC: &'static str =
        "Verify the output meets all task requirements.";

    /// Create a task with the given plan id and instructions, all other
    /// fields at their documented defaults.
    pub fn new(plan_id: impl Into<String>, instructions: impl Into<String>) -> Self {
        let plan_id = plan_id.into();
        Self {
            id: plan_id.clone(),
            title: format!("Task {plan_id}"),
            plan_id,
            instructions: instructions.into(),
            dependencies: Vec::new(),
            concurrency_group: None,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            worker_role: Self::DEFAULT_WORKER_ROLE.to_string(),
            verifier_role: Self::DEFAULT_VERIFIER_ROLE.to_string(),
            verification_spec: Self::DEFAULT_VERIFICATION_SPEC.to_string(),
            status: TaskStatus::default(),
            attempt: 0,
            history: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the dependency list.
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Set the retry bound.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Prefix the task id and its dependency references with a run id,
    /// making ids globally unique across runs. The plan id is preserved
    /// for display.
    pub fn qualify(&mut self, run_id: &str) {
        self.id = format!("{run_id}-{}", self.plan_id);
        for dep in &mut self.dependencies {
            *dep = format!("{run_id}-{dep}");
        }
    }

    /// Move to `new_status`, enforcing the lifecycle table.
    pub fn transition_to(&mut self, new_status: TaskStatus) -> Result<(), EngineError> {
        if !self.status.can_transition_to(new_status) {
            return Err(EngineError::InvalidTransition {
                task_id: self.id.clone(),
                from: self.status.as_str().to_string(),
                to: new_status.as_str().to_string(),
            });
        }
        self.status = new_status;
        Ok(())
    }

    /// The verification report of the most recent attempt, if any.
    pub fn last_verification(&self) -> Option<&VerificationReport> {
        self.history.iter().rev().find_map(|r| r.verification.as_ref())
    }

    /// Final score across history: the last recorded verification score.
    pub fn final_score(&self) -> Option<u8> {
        self.last_verification().map(|v| v.score)
    }
}
