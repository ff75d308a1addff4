//! Duplicate-submission suppression.
//!
//! Upstream hosts occasionally deliver the same plan twice in quick
//! succession (double submits, retry storms). The deduplicator fingerprints
//! each submission and rejects an identical one arriving inside a TTL
//! window. The clock is injected so the window is testable without
//! sleeping, and expired entries are pruned on every check.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::domain::ports::{Clock, SystemClock};

/// Rejection of a submission already seen inside the TTL window.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("duplicate submission: identical plan accepted {elapsed_secs:.1}s ago")]
pub struct DuplicateSubmission {
    /// Seconds since the original submission.
    pub elapsed_secs: f64,
}

/// TTL-windowed submission deduplicator.
pub struct RequestDeduplicator {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    seen: Mutex<HashMap<String, std::time::Instant>>,
}

impl RequestDeduplicator {
    /// Create a deduplicator with an injected clock.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ttl,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Create a deduplicator on the wall clock.
    pub fn with_system_clock(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    /// Admit or reject a submission.
    ///
    /// A rejected submission is not re-armed: the original entry keeps its
    /// timestamp, so a burst of duplicates all age out together.
    pub fn check(&self, plan_text: &str, model: &str) -> Result<(), DuplicateSubmission> {
        let key = fingerprint(plan_text, model);
        let now = self.clock.now();

        let mut seen = self.seen.lock().unwrap();
        seen.retain(|_, first| now.duration_since(*first) < self.ttl);

        if let Some(first) = seen.get(&key) {
            return Err(DuplicateSubmission {
                elapsed_secs: now.duration_since(*first).as_secs_f64(),
            });
        }

        seen.insert(key, now);
        debug!(entries = seen.len(), "submission admitted");
        Ok(())
    }
}

/// Stable fingerprint over plan text and model selection.
fn fingerprint(plan_text: &str, model: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plan_text.as_bytes());
    hasher.update(b":");
    hasher.update(model.as_bytes());
    format!("{:x}", hasher.finalize())
}
