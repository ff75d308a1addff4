//! Wave scheduling: ready-set computation over the task graph.
//!
//! The scheduler is stateless between calls. Readiness is recomputed from
//! scratch each wave from the caller-supplied completed/terminal sets, which
//! is simpler than incremental bookkeeping and trivially correct at the
//! graph sizes plans produce (tens of tasks).

use std::collections::{BTreeMap, HashSet};

use crate::domain::models::Task;

use super::dependency_graph::TaskGraph;

/// Compute the next wave: tasks not yet terminal whose full dependency set
/// is contained in `completed`.
///
/// Ids are returned in document order. An empty result with unterminated
/// tasks remaining signals a deadlock; the controller halts rather than
/// looping.
pub fn next_wave(
    graph: &TaskGraph,
    completed: &HashSet<String>,
    terminal: &HashSet<String>,
) -> Vec<String> {
    graph
        .order()
        .iter()
        .filter(|id| !terminal.contains(id.as_str()))
        .filter(|id| {
            graph
                .dependencies_of(id.as_str())
                .iter()
                .all(|dep| completed.contains(dep.as_str()))
        })
        .cloned()
        .collect()
}

/// Partition a wave by concurrency group for display batching.
///
/// Groups never gate execution; the whole wave runs concurrently regardless.
/// Ungrouped tasks sort first under `None`, then groups in ascending order.
pub fn partition_groups<'a>(
    wave: &[String],
    tasks: &'a BTreeMap<String, Task>,
) -> Vec<(Option<i64>, Vec<&'a Task>)> {
    let mut grouped: BTreeMap<Option<i64>, Vec<&Task>> = BTreeMap::new();
    for id in wave {
        if let Some(task) = tasks.get(id) {
            grouped.entry(task.concurrency_group).or_default().push(task);
        }
    }
    grouped.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, deps: &[&str]) -> Task {
        Task::new(id, "work")
            .with_dependencies(deps.iter().map(ToString::to_string).collect())
    }

    fn sets(completed: &[&str], failed: &[&str]) -> (HashSet<String>, HashSet<String>) {
        let completed: HashSet<String> = completed.iter().map(ToString::to_string).collect();
        let mut terminal = completed.clone();
        terminal.extend(failed.iter().map(ToString::to_string));
        (completed, terminal)
    }

    #[test]
    fn first_wave_is_the_dependency_free_tasks() {
        let tasks = vec![
            task("task-1", &[]),
            task("task-2", &["task-1"]),
            task("task-3", &["task-1"]),
        ];
        let graph = TaskGraph::build(&tasks);
        let (completed, terminal) = sets(&[], &[]);
        assert_eq!(next_wave(&graph, &completed, &terminal), ["task-1"]);
    }

    #[test]
    fn second_wave_opens_after_completion() {
        let tasks = vec![
            task("task-1", &[]),
            task("task-2", &["task-1"]),
            task("task-3", &["task-1"]),
        ];
        let graph = TaskGraph::build(&tasks);
        let (completed, terminal) = sets(&["task-1"], &[]);
        assert_eq!(
            next_wave(&graph, &completed, &terminal),
            ["task-2", "task-3"]
        );
    }

    #[test]
    fn failed_dependency_never_readies_dependents() {
        let tasks = vec![task("task-1", &[]), task("task-2", &["task-1"])];
        let graph = TaskGraph::build(&tasks);
        // task-1 terminal but not completed: it failed.
        let (completed, terminal) = sets(&[], &["task-1"]);
        assert!(next_wave(&graph, &completed, &terminal).is_empty());
    }

    #[test]
    fn terminal_tasks_are_not_rescheduled() {
        let tasks = vec![task("task-1", &[])];
        let graph = TaskGraph::build(&tasks);
        let (completed, terminal) = sets(&["task-1"], &[]);
        assert!(next_wave(&graph, &completed, &terminal).is_empty());
    }

    #[test]
    fn readiness_is_recomputed_from_scratch() {
        let tasks = vec![task("task-1", &[]), task("task-2", &["task-1"])];
        let graph = TaskGraph::build(&tasks);
        let (completed, terminal) = sets(&[], &[]);
        // Same inputs, same answer: no hidden state between calls.
        assert_eq!(next_wave(&graph, &completed, &terminal), ["task-1"]);
        assert_eq!(next_wave(&graph, &completed, &terminal), ["task-1"]);
    }

    #[test]
    fn partition_orders_ungrouped_first_then_ascending() {
        let mut a = task("task-1", &[]);
        a.concurrency_group = Some(2);
        let mut b = task("task-2", &[]);
        b.concurrency_group = Some(1);
        let c = task("task-3", &[]);

        let wave: Vec<String> = ["task-1", "task-2", "task-3"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let tasks: BTreeMap<String, Task> = [a, b, c]
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();

        let groups = partition_groups(&wave, &tasks);
        let keys: Vec<Option<i64>> = groups.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![None, Some(1), Some(2)]);
    }
}
