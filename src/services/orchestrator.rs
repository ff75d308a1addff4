//! Wave-by-wave orchestration of a parsed task plan.
//!
//! The controller validates the dependency graph, then alternates between
//! asking the scheduler for the next ready wave and running that wave to
//! completion. Waves are separated by a full barrier: no task of wave N+1
//! starts before every task of wave N has reached a terminal state. A failed
//! task never cancels its siblings, but it does stop the run from advancing
//! to the next wave.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    Disposition, EngineConfig, HaltReason, RunReport, Task, TaskReport, TaskStatus,
};
use crate::domain::ports::{StateStore, TransitionRecord, VerifierCapability, WorkerCapability};

use super::dependency_graph::TaskGraph;
use super::events::EngineEvent;
use super::task_runner::{RunnerConfig, TaskOutcome, TaskRunner};
use super::wave_scheduler::next_wave;

/// Tuning for the orchestration controller.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum tasks in flight within one wave.
    pub max_concurrency: usize,
    /// Runner tuning shared by every task.
    pub runner: RunnerConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            runner: RunnerConfig::default(),
        }
    }
}

impl From<&EngineConfig> for OrchestratorConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency.max(1),
            runner: RunnerConfig::from(config),
        }
    }
}

/// Drives a full run: graph validation, wave loop, cascade policy, report.
pub struct Orchestrator {
    worker: Arc<dyn WorkerCapability>,
    verifier: Arc<dyn VerifierCapability>,
    store: Arc<dyn StateStore>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create a controller over the given capabilities.
    pub fn new(
        worker: Arc<dyn WorkerCapability>,
        verifier: Arc<dyn VerifierCapability>,
        store: Arc<dyn StateStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            worker,
            verifier,
            store,
            config,
        }
    }

    /// Execute a plan without observing progress events.
    pub async fn execute(&self, tasks: Vec<Task>) -> DomainResult<RunReport> {
        let (tx, _rx) = mpsc::channel(64);
        self.execute_with_events(tasks, tx).await
    }

    /// Execute a plan, streaming progress events to `events`.
    ///
    /// Graph validation failures abort before any worker call. An empty task
    /// list is "no work to do" and yields an empty, successful report.
    pub async fn execute_with_events(
        &self,
        mut tasks: Vec<Task>,
        events: mpsc::Sender<EngineEvent>,
    ) -> DomainResult<RunReport> {
        let started = Instant::now();
        let run_id = format!("run-{}", Uuid::new_v4().simple());

        for task in &mut tasks {
            task.qualify(&run_id);
        }

        let graph = TaskGraph::build(&tasks);
        graph.validate()?;

        let total = tasks.len();
        info!(%run_id, total, "starting run");
        let _ = events
            .send(EngineEvent::RunStarted {
                run_id: run_id.clone(),
                total,
            })
            .await;

        let mut task_map: BTreeMap<String, Task> =
            tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
        let mut outcomes: HashMap<String, TaskOutcome> = HashMap::new();
        let mut completed: HashSet<String> = HashSet::new();
        let mut terminal: HashSet<String> = HashSet::new();
        let mut failed_ids: Vec<String> = Vec::new();
        let mut waves = 0usize;
        let mut halt: Option<HaltReason> = None;

        let runner = Arc::new(TaskRunner::new(
            self.worker.clone(),
            self.verifier.clone(),
            self.store.clone(),
            self.config.runner.clone(),
        ));

        loop {
            let wave = next_wave(&graph, &completed, &terminal);
            if wave.is_empty() {
                if terminal.len() < total {
                    let remaining: Vec<String> = graph
                        .order()
                        .iter()
                        .filter(|id| !terminal.contains(*id))
                        .cloned()
                        .collect();
                    warn!(remaining = remaining.len(), "no task is ready; halting");
                    halt = Some(HaltReason::Deadlock { remaining });
                }
                break;
            }

            waves += 1;
            info!(wave = waves, tasks = wave.len(), "starting wave");
            let _ = events
                .send(EngineEvent::WaveStarted {
                    wave: waves,
                    task_count: wave.len(),
                })
                .await;

            let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
            let mut handles = Vec::with_capacity(wave.len());

            for id in &wave {
                let Some(mut task) = task_map.remove(id) else {
                    continue;
                };

                self.mark_ready(&mut task).await;

                let permit = match semaphore.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        task_map.insert(task.id.clone(), task);
                        continue;
                    }
                };

                let runner = runner.clone();
                let events = events.clone();
                handles.push(tokio::spawn(async move {
                    let _permit = permit;
                    let outcome = runner.run(&mut task, &events).await;
                    (task, outcome)
                }));
            }

            // Wave barrier: every spawned task resolves before the next
            // wave is considered. Siblings of a failed task keep running.
            let mut wave_succeeded = 0usize;
            let mut wave_failed = 0usize;
            for handle in handles {
                match handle.await {
                    Ok((task, outcome)) => {
                        terminal.insert(outcome.task_id.clone());
                        if outcome.is_completed() {
                            completed.insert(outcome.task_id.clone());
                            wave_succeeded += 1;
                        } else {
                            failed_ids.push(outcome.task_id.clone());
                            wave_failed += 1;
                        }
                        outcomes.insert(outcome.task_id.clone(), outcome);
                        task_map.insert(task.id.clone(), task);
                    }
                    Err(err) => {
                        warn!(%err, "task join failed");
                    }
                }
            }

            let _ = events
                .send(EngineEvent::WaveCompleted {
                    wave: waves,
                    succeeded: wave_succeeded,
                    failed: wave_failed,
                })
                .await;

            if wave_failed > 0 {
                info!(
                    failed = wave_failed,
                    "task failure in wave; not starting the next wave"
                );
                halt = Some(HaltReason::CascadeStop {
                    failed: failed_ids.clone(),
                });
                break;
            }
        }

        let report = build_report(
            run_id,
            &graph,
            &task_map,
            &outcomes,
            waves,
            halt,
            started.elapsed().as_secs(),
        );

        let _ = events
            .send(EngineEvent::RunCompleted {
                completed: report.completed,
                failed: report.failed,
                skipped: report.skipped,
            })
            .await;
        info!(
            completed = report.completed,
            failed = report.failed,
            skipped = report.skipped,
            "run finished"
        );

        Ok(report)
    }

    /// Record and apply the Pending -> Ready transition.
    async fn mark_ready(&self, task: &mut Task) {
        let record = TransitionRecord::new(&task.id, TaskStatus::Ready, task.attempt);
        if let Err(err) = self.store.record(record).await {
            warn!(task_id = %task.id, %err, "state store write failed; continuing");
        }
        if let Err(err) = task.transition_to(TaskStatus::Ready) {
            warn!(task_id = %task.id, %err, "unexpected transition rejection");
        }
    }
}

/// Assemble the terminal report in plan order.
#[allow(clippy::too_many_arguments)]
fn build_report(
    run_id: String,
    graph: &TaskGraph,
    task_map: &BTreeMap<String, Task>,
    outcomes: &HashMap<String, TaskOutcome>,
    waves: usize,
    halt: Option<HaltReason>,
    duration_secs: u64,
) -> RunReport {
    let failed_set: HashSet<&String> = match &halt {
        Some(HaltReason::CascadeStop { failed }) => failed.iter().collect(),
        _ => HashSet::new(),
    };

    let mut rows = Vec::with_capacity(graph.len());
    let mut completed = 0usize;
    let mut failed = 0usize;
    let mut skipped = 0usize;

    for id in graph.order() {
        let Some(task) = task_map.get(id) else {
            continue;
        };
        let disposition = match task.status {
            TaskStatus::Completed => {
                completed += 1;
                Disposition::Completed {
                    score: task.final_score().unwrap_or(0),
                    attempts: task.attempt,
                }
            }
            TaskStatus::Failed => {
                failed += 1;
                let reason = outcomes
                    .get(id)
                    .and_then(|o| o.error.clone())
                    .unwrap_or_else(|| "unknown failure".to_string());
                Disposition::Failed {
                    reason,
                    score: task.final_score(),
                    attempts: task.attempt,
                }
            }
            _ => {
                skipped += 1;
                Disposition::Skipped {
                    reason: skip_reason(graph, id, &failed_set, halt.as_ref()),
                }
            }
        };

        rows.push(TaskReport {
            task_id: task.id.clone(),
            plan_id: task.plan_id.clone(),
            title: task.title.clone(),
            disposition,
            feedback: task.last_verification().map(|v| v.feedback.clone()),
        });
    }

    RunReport {
        run_id,
        total: graph.len(),
        completed,
        failed,
        skipped,
        waves,
        duration_secs,
        halt,
        tasks: rows,
    }
}

/// Human-readable reason a task never ran.
fn skip_reason(
    graph: &TaskGraph,
    task_id: &str,
    failed: &HashSet<&String>,
    halt: Option<&HaltReason>,
) -> String {
    if let Some(dep) = graph
        .dependencies_of(task_id)
        .iter()
        .find(|dep| failed.contains(dep))
    {
        return format!("not started: dependency '{dep}' failed");
    }
    match halt {
        Some(HaltReason::CascadeStop { .. }) => {
            "not started: run halted after an earlier failure".to_string()
        }
        Some(HaltReason::Deadlock { .. }) => {
            "not started: task never became ready".to_string()
        }
        None => "not started".to_string(),
    }
}
