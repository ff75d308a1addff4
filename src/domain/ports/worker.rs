//! Worker capability port.

use async_trait::async_trait;

use crate::domain::errors::CapabilityError;
use crate::domain::models::VerificationReport;

/// Input to one worker invocation.
///
/// Retry attempts carry the prior verification report so later attempts are
/// strictly more informed than earlier ones; how that feedback is folded
/// into the prompt is the adapter's concern.
#[derive(Debug, Clone)]
pub struct WorkRequest {
    /// Run-qualified task id.
    pub task_id: String,
    /// Task title.
    pub title: String,
    /// Work description.
    pub instructions: String,
    /// Role descriptor for the worker, opaque to the engine.
    pub role: String,
    /// 1-based attempt number.
    pub attempt: u32,
    /// Ids of the task's dependencies, for context.
    pub dependencies: Vec<String>,
    /// Verification result of the prior attempt, present on retries.
    pub prior_feedback: Option<VerificationReport>,
}

/// Port for the capability that performs a task's work.
///
/// Any error is infrastructure-fatal for the attempt: the engine reserves
/// retries for quality-gated rework, not transport faults.
#[async_trait]
pub trait WorkerCapability: Send + Sync {
    /// Capability name for logging.
    fn name(&self) -> &'static str;

    /// Produce output for the request.
    async fn generate(&self, request: WorkRequest) -> Result<String, CapabilityError>;
}
