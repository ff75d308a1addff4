//! Property tests for scheduling and retry bounds.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use mimir::domain::models::{Task, Verdict};
use mimir::domain::ports::NullStateStore;
use mimir::infrastructure::llm::{MockVerifier, MockWorker};
use mimir::services::{next_wave, Orchestrator, OrchestratorConfig, TaskGraph};

/// Generate a layered acyclic task set: every even-indexed task depends on
/// its predecessor, odd-indexed tasks are free.
fn layered_tasks(size: usize) -> Vec<Task> {
    let ids: Vec<String> = (1..=size).map(|i| format!("task-{i}")).collect();
    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            let deps = if i > 0 && i % 2 == 0 {
                vec![ids[i - 1].clone()]
            } else {
                vec![]
            };
            Task::new(id, "property test work").with_dependencies(deps)
        })
        .collect()
}

proptest! {
    /// Property: simulated wave progression drains every acyclic graph.
    ///
    /// Each wave strictly removes at least one task from "remaining", so
    /// the loop terminates with all tasks scheduled exactly once.
    #[test]
    fn prop_waves_drain_acyclic_graphs(size in 1usize..30) {
        let tasks = layered_tasks(size);
        let graph = TaskGraph::build(&tasks);
        prop_assert!(graph.validate().is_ok());

        let mut completed: HashSet<String> = HashSet::new();
        let mut seen: Vec<String> = Vec::new();
        let mut rounds = 0usize;

        loop {
            let wave = next_wave(&graph, &completed, &completed);
            if wave.is_empty() {
                break;
            }
            rounds += 1;
            prop_assert!(rounds <= size, "wave loop failed to make progress");
            seen.extend(wave.iter().cloned());
            completed.extend(wave);
        }

        prop_assert_eq!(seen.len(), size, "every task scheduled exactly once");
        let unique: HashSet<&String> = seen.iter().collect();
        prop_assert_eq!(unique.len(), size);
    }

    /// Property: no task is ever scheduled before all of its dependencies.
    #[test]
    fn prop_waves_respect_dependencies(size in 1usize..30) {
        let tasks = layered_tasks(size);
        let graph = TaskGraph::build(&tasks);

        let mut completed: HashSet<String> = HashSet::new();
        let mut position: HashMap<String, usize> = HashMap::new();
        let mut round = 0usize;

        loop {
            let wave = next_wave(&graph, &completed, &completed);
            if wave.is_empty() {
                break;
            }
            round += 1;
            for id in &wave {
                position.insert(id.clone(), round);
            }
            completed.extend(wave);
        }

        for task in &tasks {
            for dep in &task.dependencies {
                let dep_round = position.get(dep)
                    .ok_or_else(|| TestCaseError::fail(format!("{dep} never scheduled")))?;
                let task_round = position.get(&task.id)
                    .ok_or_else(|| TestCaseError::fail(format!("{} never scheduled", task.id)))?;
                prop_assert!(
                    dep_round < task_round,
                    "{} in round {} before its dependency {} in round {}",
                    task.id, task_round, dep, dep_round
                );
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Property: a run over any layered acyclic graph with an always-pass
    /// verifier terminates with every task completed.
    #[test]
    fn prop_execute_terminates_and_completes_all(size in 1usize..12) {
        let tasks = layered_tasks(size);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let report = runtime.block_on(async {
            let orch = Orchestrator::new(
                Arc::new(MockWorker::echo()),
                Arc::new(MockVerifier::always(Verdict::Pass, 90)),
                Arc::new(NullStateStore),
                OrchestratorConfig::default(),
            );
            orch.execute(tasks).await
        }).map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(report.total, size);
        prop_assert_eq!(report.completed, size);
        prop_assert!(report.is_success());
    }

    /// Property: with an always-fail verifier, a task with `max_retries = N`
    /// sees exactly N + 1 worker invocations.
    #[test]
    fn prop_worker_invocations_bounded(max_retries in 0u32..4) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let calls = runtime.block_on(async {
            let worker = MockWorker::echo();
            let calls = worker.calls();
            let orch = Orchestrator::new(
                Arc::new(worker),
                Arc::new(MockVerifier::always(Verdict::Fail, 10)),
                Arc::new(NullStateStore),
                OrchestratorConfig::default(),
            );
            let task = Task::new("task-1", "work").with_max_retries(max_retries);
            let _ = orch.execute(vec![task]).await;
            calls.load(Ordering::SeqCst)
        });

        prop_assert_eq!(calls, max_retries + 1);
    }
}
