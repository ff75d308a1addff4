//! Verifier capability port.

use async_trait::async_trait;

use crate::domain::errors::CapabilityError;
use crate::domain::models::VerificationReport;

/// Input to one verification step.
#[derive(Debug, Clone)]
pub struct VerifyRequest {
    /// Run-qualified task id.
    pub task_id: String,
    /// The task's work description, restated for the verifier.
    pub instructions: String,
    /// Worker output under judgment.
    pub output: String,
    /// Verification criteria, opaque to the engine.
    pub spec: String,
    /// Role descriptor for the verifier, opaque to the engine.
    pub role: String,
}

/// Port for the capability that judges worker output.
///
/// Implementations must return a structured report; free-text judgments are
/// parsed into one inside the adapter, never inside the engine.
#[async_trait]
pub trait VerifierCapability: Send + Sync {
    /// Capability name for logging.
    fn name(&self) -> &'static str;

    /// Judge the output against the request's criteria.
    async fn verify(&self, request: VerifyRequest) -> Result<VerificationReport, CapabilityError>;
}
