//! Scripted mock capabilities for tests and dry runs.
//!
//! Shipped in-tree (not behind `cfg(test)`) so the CLI's `--dry-run` path
//! and the integration suite share one implementation.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::CapabilityError;
use crate::domain::models::{VerificationReport, Verdict};
use crate::domain::ports::{VerifierCapability, VerifyRequest, WorkRequest, WorkerCapability};

#[derive(Debug, Clone)]
enum WorkerBehavior {
    Echo,
    Fail(String),
    Slow(Duration),
}

/// Worker mock with observable call history.
pub struct MockWorker {
    behavior: WorkerBehavior,
    calls: Arc<AtomicU32>,
    feedback: Arc<Mutex<Vec<Option<VerificationReport>>>>,
}

impl MockWorker {
    fn with_behavior(behavior: WorkerBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicU32::new(0)),
            feedback: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Worker that answers every request with a canned output.
    pub fn echo() -> Self {
        Self::with_behavior(WorkerBehavior::Echo)
    }

    /// Worker that fails every request with a transport error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(WorkerBehavior::Fail(message.into()))
    }

    /// Worker that sleeps before answering, for timeout tests.
    pub fn slow(delay: Duration) -> Self {
        Self::with_behavior(WorkerBehavior::Slow(delay))
    }

    /// Shared invocation counter.
    pub fn calls(&self) -> Arc<AtomicU32> {
        self.calls.clone()
    }

    /// Shared log of the prior feedback each invocation carried.
    pub fn feedback_log(&self) -> Arc<Mutex<Vec<Option<VerificationReport>>>> {
        self.feedback.clone()
    }
}

#[async_trait]
impl WorkerCapability for MockWorker {
    fn name(&self) -> &'static str {
        "mock-worker"
    }

    async fn generate(&self, request: WorkRequest) -> Result<String, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.feedback
            .lock()
            .unwrap()
            .push(request.prior_feedback.clone());

        match &self.behavior {
            WorkerBehavior::Echo => Ok(format!(
                "Output for {} (attempt {})",
                request.task_id, request.attempt
            )),
            WorkerBehavior::Fail(message) => Err(CapabilityError::Transport(message.clone())),
            WorkerBehavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(format!("Late output for {}", request.task_id))
            }
        }
    }
}

/// Verifier mock with a default report, optional per-task scripts, and an
/// optional global script.
pub struct MockVerifier {
    default: VerificationReport,
    fail: Option<String>,
    script: Mutex<VecDeque<VerificationReport>>,
    task_scripts: Mutex<HashMap<String, VecDeque<VerificationReport>>>,
    calls: Arc<AtomicU32>,
}

impl MockVerifier {
    /// Canned report with generated feedback.
    pub fn report(verdict: Verdict, score: u8) -> VerificationReport {
        VerificationReport {
            verdict,
            score,
            feedback: format!("mock verification: {} at {score}/100", verdict.as_str()),
            issues: vec![],
            required_fixes: vec![],
        }
    }

    /// Verifier that answers every request with the same verdict and score.
    pub fn always(verdict: Verdict, score: u8) -> Self {
        Self {
            default: Self::report(verdict, score),
            fail: None,
            script: Mutex::new(VecDeque::new()),
            task_scripts: Mutex::new(HashMap::new()),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Verifier that works through `reports` in order, then repeats the
    /// last one.
    pub fn scripted(reports: Vec<VerificationReport>) -> Self {
        let default = reports
            .last()
            .cloned()
            .unwrap_or_else(|| Self::report(Verdict::Pass, 100));
        Self {
            default,
            fail: None,
            script: Mutex::new(reports.into()),
            task_scripts: Mutex::new(HashMap::new()),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Verifier that fails every request with a transport error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            default: Self::report(Verdict::Fail, 0),
            fail: Some(message.into()),
            script: Mutex::new(VecDeque::new()),
            task_scripts: Mutex::new(HashMap::new()),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Script reports for one task. `key` matches the request's task id
    /// exactly or as a `-`-separated suffix, so plan ids keep working after
    /// run qualification.
    pub fn with_task_reports(self, key: impl Into<String>, reports: Vec<VerificationReport>) -> Self {
        self.task_scripts
            .lock()
            .unwrap()
            .insert(key.into(), reports.into());
        self
    }

    /// Shared invocation counter.
    pub fn calls(&self) -> Arc<AtomicU32> {
        self.calls.clone()
    }

    fn next_report(&self, task_id: &str) -> VerificationReport {
        let mut task_scripts = self.task_scripts.lock().unwrap();
        let matched = task_scripts
            .iter_mut()
            .find(|(key, _)| task_id == key.as_str() || task_id.ends_with(&format!("-{key}")))
            .and_then(|(_, queue)| queue.pop_front());
        if let Some(report) = matched {
            return report;
        }
        drop(task_scripts);

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default.clone())
    }
}

#[async_trait]
impl VerifierCapability for MockVerifier {
    fn name(&self) -> &'static str {
        "mock-verifier"
    }

    async fn verify(&self, request: VerifyRequest) -> Result<VerificationReport, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail {
            return Err(CapabilityError::Transport(message.clone()));
        }
        Ok(self.next_report(&request.task_id))
    }
}
