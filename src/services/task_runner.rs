//! Per-task worker/verify/retry state machine.
//!
//! Drives one task from `Ready` to a terminal state:
//!
//! ```text
//! Ready -> Running -> AwaitingVerification -> {Completed | Retrying -> Running | Failed}
//! ```
//!
//! Retries are reserved for quality-gated rework. A capability fault
//! (transport error or timeout) terminates the task immediately; the
//! `max_retries` bound is the circuit breaker on verification failures.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::domain::errors::CapabilityError;
use crate::domain::models::{
    AttemptRecord, EngineConfig, Task, TaskStatus, VerificationReport,
};
use crate::domain::ports::{
    StateStore, TransitionRecord, VerifierCapability, VerifyRequest, WorkRequest,
    WorkerCapability,
};

use super::events::EngineEvent;

/// Tuning for the task runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Minimum score for a `Pass` verdict to complete a task.
    pub pass_threshold: u8,
    /// Deadline for each worker/verifier call.
    pub capability_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            pass_threshold: 80,
            capability_timeout: Duration::from_secs(300),
        }
    }
}

impl From<&EngineConfig> for RunnerConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            pass_threshold: config.pass_threshold,
            capability_timeout: Duration::from_secs(config.capability_timeout_secs),
        }
    }
}

/// Terminal result of running one task.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    /// Run-qualified task id.
    pub task_id: String,
    /// Terminal status: `Completed` or `Failed`.
    pub status: TaskStatus,
    /// Worker invocations used.
    pub attempts: u32,
    /// Verification of the final attempt, when one was produced.
    pub final_verification: Option<VerificationReport>,
    /// Failure reason for non-completed outcomes.
    pub error: Option<String>,
}

impl TaskOutcome {
    /// Whether the task completed.
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Runs a single task through the worker/verify/retry loop.
pub struct TaskRunner {
    worker: Arc<dyn WorkerCapability>,
    verifier: Arc<dyn VerifierCapability>,
    store: Arc<dyn StateStore>,
    config: RunnerConfig,
}

impl TaskRunner {
    /// Create a runner over the given capabilities.
    pub fn new(
        worker: Arc<dyn WorkerCapability>,
        verifier: Arc<dyn VerifierCapability>,
        store: Arc<dyn StateStore>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            worker,
            verifier,
            store,
            config,
        }
    }

    /// Drive `task` to a terminal state. The task must be `Ready`.
    ///
    /// The runner owns the task exclusively for the duration of the call;
    /// no other writer touches it until the outcome is returned.
    pub async fn run(&self, task: &mut Task, events: &mpsc::Sender<EngineEvent>) -> TaskOutcome {
        let max_attempts = task.max_retries + 1;

        loop {
            task.attempt += 1;
            let attempt = task.attempt;

            if attempt == 1 {
                let _ = events
                    .send(EngineEvent::TaskStarted {
                        task_id: task.id.clone(),
                        title: task.title.clone(),
                    })
                    .await;
            }

            let record = TransitionRecord::new(&task.id, TaskStatus::Running, attempt);
            self.advance(task, record).await;

            let request = WorkRequest {
                task_id: task.id.clone(),
                title: task.title.clone(),
                instructions: task.instructions.clone(),
                role: task.worker_role.clone(),
                attempt,
                dependencies: task.dependencies.clone(),
                prior_feedback: task.last_verification().cloned(),
            };

            debug!(task_id = %task.id, attempt, worker = self.worker.name(), "invoking worker");
            let output = match self.call(self.worker.generate(request)).await {
                Ok(output) => output,
                Err(err) => return self.fail_on_capability(task, None, err, events).await,
            };

            let _ = events
                .send(EngineEvent::TaskVerifying {
                    task_id: task.id.clone(),
                    attempt,
                })
                .await;
            let record =
                TransitionRecord::new(&task.id, TaskStatus::AwaitingVerification, attempt);
            self.advance(task, record).await;

            let request = VerifyRequest {
                task_id: task.id.clone(),
                instructions: task.instructions.clone(),
                output: output.clone(),
                spec: task.verification_spec.clone(),
                role: task.verifier_role.clone(),
            };

            debug!(task_id = %task.id, attempt, verifier = self.verifier.name(), "invoking verifier");
            let report = match self.call(self.verifier.verify(request)).await {
                Ok(report) => report,
                Err(err) => return self.fail_on_capability(task, Some(output), err, events).await,
            };

            task.history
                .push(AttemptRecord::verified(attempt, output, report.clone()));

            if report.passes(self.config.pass_threshold) {
                let record = TransitionRecord::new(&task.id, TaskStatus::Completed, attempt)
                    .with_verification(report.score, report.verdict);
                self.advance(task, record).await;
                let _ = events
                    .send(EngineEvent::TaskCompleted {
                        task_id: task.id.clone(),
                        score: report.score,
                        attempts: attempt,
                    })
                    .await;
                return TaskOutcome {
                    task_id: task.id.clone(),
                    status: TaskStatus::Completed,
                    attempts: attempt,
                    final_verification: Some(report),
                    error: None,
                };
            }

            if attempt > task.max_retries {
                let reason = format!(
                    "verification failed after {attempt} attempt(s); last score {}/100",
                    report.score
                );
                let record = TransitionRecord::new(&task.id, TaskStatus::Failed, attempt)
                    .with_verification(report.score, report.verdict)
                    .with_detail(reason.clone());
                self.advance(task, record).await;
                let _ = events
                    .send(EngineEvent::TaskFailed {
                        task_id: task.id.clone(),
                        reason: reason.clone(),
                        attempts: attempt,
                    })
                    .await;
                return TaskOutcome {
                    task_id: task.id.clone(),
                    status: TaskStatus::Failed,
                    attempts: attempt,
                    final_verification: Some(report),
                    error: Some(reason),
                };
            }

            let record = TransitionRecord::new(&task.id, TaskStatus::Retrying, attempt)
                .with_verification(report.score, report.verdict);
            self.advance(task, record).await;
            let _ = events
                .send(EngineEvent::TaskRetrying {
                    task_id: task.id.clone(),
                    attempt: attempt + 1,
                    max_attempts,
                    score: report.score,
                })
                .await;
        }
    }

    /// Wrap a capability call in the configured deadline.
    async fn call<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, CapabilityError>>,
    ) -> Result<T, CapabilityError> {
        match timeout(self.config.capability_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CapabilityError::Timeout {
                timeout_secs: self.config.capability_timeout.as_secs(),
            }),
        }
    }

    /// Terminate the task on an infrastructure fault.
    async fn fail_on_capability(
        &self,
        task: &mut Task,
        output: Option<String>,
        err: CapabilityError,
        events: &mpsc::Sender<EngineEvent>,
    ) -> TaskOutcome {
        let reason = err.to_string();
        task.history
            .push(AttemptRecord::errored(task.attempt, output, reason.clone()));
        let record = TransitionRecord::new(&task.id, TaskStatus::Failed, task.attempt)
            .with_detail(reason.clone());
        self.advance(task, record).await;
        let _ = events
            .send(EngineEvent::TaskFailed {
                task_id: task.id.clone(),
                reason: reason.clone(),
                attempts: task.attempt,
            })
            .await;
        TaskOutcome {
            task_id: task.id.clone(),
            status: TaskStatus::Failed,
            attempts: task.attempt,
            final_verification: None,
            error: Some(reason),
        }
    }

    /// Record the transition, then apply it.
    ///
    /// The store write happens first so a crash mid-run leaves a replayable
    /// trail; a store failure is logged and never blocks the state machine.
    async fn advance(&self, task: &mut Task, record: TransitionRecord) {
        let status = record.status;
        if let Err(err) = self.store.record(record).await {
            warn!(task_id = %task.id, %status, %err, "state store write failed; continuing");
        }
        if let Err(err) = task.transition_to(status) {
            warn!(task_id = %task.id, %err, "unexpected transition rejection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Verdict;
    use crate::domain::ports::NullStateStore;
    use crate::infrastructure::llm::mock::{MockVerifier, MockWorker};
    use crate::infrastructure::store::MemoryStateStore;

    fn ready_task(max_retries: u32) -> Task {
        let mut task = Task::new("task-1", "do the work").with_max_retries(max_retries);
        task.transition_to(TaskStatus::Ready).unwrap();
        task
    }

    fn runner(
        worker: MockWorker,
        verifier: MockVerifier,
        store: Arc<dyn StateStore>,
    ) -> TaskRunner {
        TaskRunner::new(
            Arc::new(worker),
            Arc::new(verifier),
            store,
            RunnerConfig::default(),
        )
    }

    fn events() -> (mpsc::Sender<EngineEvent>, mpsc::Receiver<EngineEvent>) {
        mpsc::channel(64)
    }

    #[tokio::test]
    async fn first_attempt_pass_completes() {
        let runner = runner(
            MockWorker::echo(),
            MockVerifier::always(Verdict::Pass, 90),
            Arc::new(NullStateStore),
        );
        let mut task = ready_task(2);
        let (tx, _rx) = events();

        let outcome = runner.run(&mut task, &tx).await;
        assert!(outcome.is_completed());
        assert_eq!(outcome.attempts, 1);
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.history.len(), 1);
    }

    #[tokio::test]
    async fn fail_then_pass_completes_on_second_attempt() {
        let verifier = MockVerifier::scripted(vec![
            MockVerifier::report(Verdict::Fail, 60),
            MockVerifier::report(Verdict::Pass, 85),
        ]);
        let runner = runner(MockWorker::echo(), verifier, Arc::new(NullStateStore));
        let mut task = ready_task(1);
        let (tx, _rx) = events();

        let outcome = runner.run(&mut task, &tx).await;
        assert!(outcome.is_completed());
        assert_eq!(outcome.attempts, 2);
        assert_eq!(task.attempt, 2);
        assert_eq!(task.history.len(), 2);
    }

    #[tokio::test]
    async fn retries_exhaust_into_failed() {
        let runner = runner(
            MockWorker::echo(),
            MockVerifier::always(Verdict::Fail, 40),
            Arc::new(NullStateStore),
        );
        let mut task = ready_task(2);
        let (tx, _rx) = events();

        let outcome = runner.run(&mut task, &tx).await;
        assert_eq!(outcome.status, TaskStatus::Failed);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(task.history.len(), 3);
        assert!(outcome.error.unwrap().contains("last score 40/100"));
    }

    #[tokio::test]
    async fn attempt_never_exceeds_bound() {
        let worker = MockWorker::echo();
        let calls = worker.calls();
        let runner = runner(
            worker,
            MockVerifier::always(Verdict::Fail, 10),
            Arc::new(NullStateStore),
        );
        let mut task = ready_task(1);
        let (tx, _rx) = events();

        runner.run(&mut task, &tx).await;
        assert_eq!(task.attempt, task.max_retries + 1);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn pass_verdict_below_threshold_retries() {
        let verifier = MockVerifier::scripted(vec![
            MockVerifier::report(Verdict::Pass, 79),
            MockVerifier::report(Verdict::Pass, 80),
        ]);
        let runner = runner(MockWorker::echo(), verifier, Arc::new(NullStateStore));
        let mut task = ready_task(2);
        let (tx, _rx) = events();

        let outcome = runner.run(&mut task, &tx).await;
        assert!(outcome.is_completed());
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn fail_verdict_with_high_score_does_not_pass() {
        let runner = runner(
            MockWorker::echo(),
            MockVerifier::always(Verdict::Fail, 95),
            Arc::new(NullStateStore),
        );
        let mut task = ready_task(0);
        let (tx, _rx) = events();

        let outcome = runner.run(&mut task, &tx).await;
        assert_eq!(outcome.status, TaskStatus::Failed);
    }

    #[tokio::test]
    async fn worker_fault_is_terminal_without_retry() {
        let worker = MockWorker::failing("connection refused");
        let calls = worker.calls();
        let runner = runner(
            worker,
            MockVerifier::always(Verdict::Pass, 100),
            Arc::new(NullStateStore),
        );
        let mut task = ready_task(3);
        let (tx, _rx) = events();

        let outcome = runner.run(&mut task, &tx).await;
        assert_eq!(outcome.status, TaskStatus::Failed);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert!(outcome.error.unwrap().contains("connection refused"));
        assert!(outcome.final_verification.is_none());
    }

    #[tokio::test]
    async fn verifier_fault_is_terminal() {
        let runner = runner(
            MockWorker::echo(),
            MockVerifier::failing("verifier down"),
            Arc::new(NullStateStore),
        );
        let mut task = ready_task(2);
        let (tx, _rx) = events();

        let outcome = runner.run(&mut task, &tx).await;
        assert_eq!(outcome.status, TaskStatus::Failed);
        assert_eq!(outcome.attempts, 1);
        // The worker output is preserved in history even though
        // verification never happened.
        assert!(task.history[0].output.is_some());
        assert!(task.history[0].verification.is_none());
    }

    #[tokio::test]
    async fn slow_worker_times_out_as_failure() {
        let runner = TaskRunner::new(
            Arc::new(MockWorker::slow(Duration::from_millis(200))),
            Arc::new(MockVerifier::always(Verdict::Pass, 100)),
            Arc::new(NullStateStore),
            RunnerConfig {
                pass_threshold: 80,
                capability_timeout: Duration::from_millis(20),
            },
        );
        let mut task = ready_task(2);
        let (tx, _rx) = events();

        let outcome = runner.run(&mut task, &tx).await;
        assert_eq!(outcome.status, TaskStatus::Failed);
        assert!(outcome.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn retry_attempts_carry_prior_feedback() {
        let worker = MockWorker::echo();
        let feedback_seen = worker.feedback_log();
        let verifier = MockVerifier::scripted(vec![
            VerificationReport {
                verdict: Verdict::Fail,
                score: 55,
                feedback: "missing error handling".into(),
                issues: vec!["no error path".into()],
                required_fixes: vec!["handle errors".into()],
            },
            MockVerifier::report(Verdict::Pass, 90),
        ]);
        let runner = runner(worker, verifier, Arc::new(NullStateStore));
        let mut task = ready_task(1);
        let (tx, _rx) = events();

        runner.run(&mut task, &tx).await;

        let log = feedback_seen.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert!(log[0].is_none());
        let second = log[1].as_ref().unwrap();
        assert_eq!(second.score, 55);
        assert_eq!(second.required_fixes, vec!["handle errors".to_string()]);
    }

    #[tokio::test]
    async fn transitions_are_recorded_before_status_changes() {
        let store = Arc::new(MemoryStateStore::default());
        let runner = runner(
            MockWorker::echo(),
            MockVerifier::always(Verdict::Pass, 100),
            store.clone(),
        );
        let mut task = ready_task(0);
        let (tx, _rx) = events();

        runner.run(&mut task, &tx).await;

        let statuses: Vec<TaskStatus> =
            store.records().iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                TaskStatus::Running,
                TaskStatus::AwaitingVerification,
                TaskStatus::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn store_failure_does_not_block_the_state_machine() {
        let store = Arc::new(MemoryStateStore::failing());
        let runner = runner(
            MockWorker::echo(),
            MockVerifier::always(Verdict::Pass, 100),
            store,
        );
        let mut task = ready_task(0);
        let (tx, _rx) = events();

        let outcome = runner.run(&mut task, &tx).await;
        assert!(outcome.is_completed());
    }
}
