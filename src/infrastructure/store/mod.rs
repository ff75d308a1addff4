//! State-store adapters for the audit trail.
//!
//! The engine only requires "record before transition, best-effort". The
//! tracing store turns the trail into structured log events; the memory
//! store captures it for assertions in tests.

use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

use crate::domain::errors::CapabilityError;
use crate::domain::ports::{StateStore, TransitionRecord};

/// State store that emits each transition as a structured log event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingStateStore;

#[async_trait]
impl StateStore for TracingStateStore {
    async fn record(&self, record: TransitionRecord) -> Result<(), CapabilityError> {
        info!(
            task_id = %record.task_id,
            status = %record.status,
            attempt = record.attempt,
            score = record.score,
            verdict = record.verdict.map(|v| v.as_str()),
            detail = record.detail.as_deref(),
            "task transition"
        );
        Ok(())
    }
}

/// In-memory state store capturing every record, in order.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    records: Mutex<Vec<TransitionRecord>>,
    fail: bool,
}

impl MemoryStateStore {
    /// Store that rejects every write, for degraded-path tests.
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Snapshot of the captured records.
    pub fn records(&self) -> Vec<TransitionRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn record(&self, record: TransitionRecord) -> Result<(), CapabilityError> {
        if self.fail {
            return Err(CapabilityError::Transport("store unavailable".to_string()));
        }
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}
