//! State store port for the append-only audit trail.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::CapabilityError;
use crate::domain::models::{TaskStatus, Verdict};

/// One audit-trail entry, written before the corresponding status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    /// Run-qualified task id.
    pub task_id: String,
    /// Status the task is transitioning to.
    pub status: TaskStatus,
    /// Attempt counter at the time of the transition.
    pub attempt: u32,
    /// Verification score, when the transition follows a verification.
    pub score: Option<u8>,
    /// Verification verdict, when the transition follows a verification.
    pub verdict: Option<Verdict>,
    /// Free-text detail (failure reason, retry note).
    pub detail: Option<String>,
    /// When the record was produced.
    pub recorded_at: DateTime<Utc>,
}

impl TransitionRecord {
    /// Create a record for a transition with no verification attached.
    pub fn new(task_id: impl Into<String>, status: TaskStatus, attempt: u32) -> Self {
        Self {
            task_id: task_id.into(),
            status,
            attempt,
            score: None,
            verdict: None,
            detail: None,
            recorded_at: Utc::now(),
        }
    }

    /// Attach a verification score and verdict.
    pub fn with_verification(mut self, score: u8, verdict: Verdict) -> Self {
        self.score = Some(score);
        self.verdict = Some(verdict);
        self
    }

    /// Attach free-text detail.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Port for the audit-trail store.
///
/// Best-effort: the engine logs a failed write and proceeds. Audit-trail
/// degradation is acceptable; losing task progress is not.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Persist one transition record.
    async fn record(&self, record: TransitionRecord) -> Result<(), CapabilityError>;
}

/// State store that discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStateStore;

#[async_trait]
impl StateStore for NullStateStore {
    async fn record(&self, _record: TransitionRecord) -> Result<(), CapabilityError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_store_accepts_everything() {
        tokio_test::block_on(async {
            let store = NullStateStore;
            let record = TransitionRecord::new("run-1-task-1", TaskStatus::Running, 1)
                .with_verification(85, Verdict::Pass)
                .with_detail("first attempt");
            assert!(store.record(record).await.is_ok());
        });
    }
}
