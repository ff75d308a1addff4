//! Task dependency graph: adjacency construction and validation.
//!
//! Built once per run from the parsed task list. Validation is fail-closed:
//! an unknown dependency or a cycle aborts the run before any task executes.

use std::collections::{HashMap, HashSet};

use crate::domain::errors::GraphError;
use crate::domain::models::Task;

/// Adjacency view over a run's tasks.
///
/// Forward edges point from a task to its dependencies; reverse edges from a
/// dependency to its dependents. Both are kept so readiness checks and
/// downstream-impact lookups are O(1).
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    /// Task ids in document order.
    order: Vec<String>,
    /// task id -> ids it depends on.
    dependencies: HashMap<String, Vec<String>>,
    /// task id -> ids that depend on it.
    dependents: HashMap<String, Vec<String>>,
}

impl TaskGraph {
    /// Build the adjacency structure from a task list.
    ///
    /// Construction never fails; unresolved references surface in
    /// [`TaskGraph::validate`].
    pub fn build(tasks: &[Task]) -> Self {
        let mut graph = Self {
            order: tasks.iter().map(|t| t.id.clone()).collect(),
            dependencies: HashMap::new(),
            dependents: HashMap::new(),
        };

        for task in tasks {
            graph
                .dependencies
                .insert(task.id.clone(), task.dependencies.clone());
            graph.dependents.entry(task.id.clone()).or_default();
            for dep in &task.dependencies {
                graph
                    .dependents
                    .entry(dep.clone())
                    .or_default()
                    .push(task.id.clone());
            }
        }

        graph
    }

    /// Check that every dependency resolves and the relation is acyclic.
    pub fn validate(&self) -> Result<(), GraphError> {
        let known: HashSet<&String> = self.order.iter().collect();

        for task_id in &self.order {
            for dep in &self.dependencies[task_id] {
                if !known.contains(dep) {
                    return Err(GraphError::UnknownDependency {
                        task_id: task_id.clone(),
                        missing_id: dep.clone(),
                    });
                }
            }
        }

        if let Some(path) = self.detect_cycle() {
            return Err(GraphError::Cycle(path));
        }

        Ok(())
    }

    /// Task ids in document order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Number of tasks in the graph.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the graph holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Dependencies of a task. Empty for unknown ids.
    pub fn dependencies_of(&self, task_id: &str) -> &[String] {
        self.dependencies.get(task_id).map_or(&[], Vec::as_slice)
    }

    /// Dependents of a task. Empty for unknown ids.
    pub fn dependents_of(&self, task_id: &str) -> &[String] {
        self.dependents.get(task_id).map_or(&[], Vec::as_slice)
    }

    /// Depth-first cycle search. Returns the cycle as an ordered id path,
    /// closed with a repeat of its first node.
    fn detect_cycle(&self) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for task_id in &self.order {
            if !visited.contains(task_id)
                && self.cycle_from(task_id, &mut visited, &mut rec_stack, &mut path)
            {
                return Some(path);
            }
        }
        None
    }

    fn cycle_from(
        &self,
        node: &String,
        visited: &mut HashSet<String>,
        rec_stack: &mut HashSet<String>,
        path: &mut Vec<String>,
    ) -> bool {
        visited.insert(node.clone());
        rec_stack.insert(node.clone());
        path.push(node.clone());

        for dep in self.dependencies_of(node) {
            // Unknown ids are reported by validate() before cycle search.
            if !self.dependencies.contains_key(dep) {
                continue;
            }
            if !visited.contains(dep) {
                if self.cycle_from(&dep.clone(), visited, rec_stack, path) {
                    return true;
                }
            } else if rec_stack.contains(dep) {
                if let Some(start) = path.iter().position(|id| id == dep) {
                    path.drain(0..start);
                    path.push(dep.clone());
                    return true;
                }
            }
        }

        rec_stack.remove(node);
        path.pop();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, deps: &[&str]) -> Task {
        Task::new(id, "work")
            .with_dependencies(deps.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn builds_forward_and_reverse_edges() {
        let tasks = vec![
            task("task-1", &[]),
            task("task-2", &["task-1"]),
            task("task-3", &["task-1"]),
        ];
        let graph = TaskGraph::build(&tasks);

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.dependencies_of("task-2"), ["task-1".to_string()]);
        let mut dependents = graph.dependents_of("task-1").to_vec();
        dependents.sort();
        assert_eq!(dependents, ["task-2".to_string(), "task-3".to_string()]);
        assert!(graph.dependents_of("task-3").is_empty());
    }

    #[test]
    fn valid_acyclic_graph_passes() {
        let tasks = vec![
            task("task-1", &[]),
            task("task-2", &["task-1"]),
            task("task-3", &["task-1", "task-2"]),
        ];
        assert!(TaskGraph::build(&tasks).validate().is_ok());
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let tasks = vec![task("task-1", &["task-0"])];
        let err = TaskGraph::build(&tasks).validate().unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownDependency {
                task_id: "task-1".into(),
                missing_id: "task-0".into(),
            }
        );
    }

    #[test]
    fn two_task_cycle_is_reported_with_path() {
        let tasks = vec![task("task-1", &["task-2"]), task("task-2", &["task-1"])];
        let err = TaskGraph::build(&tasks).validate().unwrap_err();
        match err {
            GraphError::Cycle(path) => {
                assert!(path.len() >= 3);
                assert_eq!(path.first(), path.last());
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let tasks = vec![task("task-1", &["task-1"])];
        assert!(matches!(
            TaskGraph::build(&tasks).validate(),
            Err(GraphError::Cycle(_))
        ));
    }

    #[test]
    fn empty_graph_is_valid() {
        let graph = TaskGraph::build(&[]);
        assert!(graph.is_empty());
        assert!(graph.validate().is_ok());
    }
}
