//! Domain errors for the Mimir orchestration engine.

use thiserror::Error;

/// Format a cycle path as a human-readable string: `a -> b -> c -> a`.
fn format_cycle_path(path: &[String]) -> String {
    path.join(" -> ")
}

/// Errors raised while validating or scheduling the task graph.
///
/// Any of these aborts the run: the engine fails closed rather than
/// executing a partially valid plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A task references a dependency id that is not part of the plan.
    #[error("task '{task_id}' depends on unknown task '{missing_id}'")]
    UnknownDependency {
        /// The task declaring the dependency.
        task_id: String,
        /// The id that could not be resolved.
        missing_id: String,
    },

    /// The dependency relation contains a cycle.
    #[error("dependency cycle detected: {}", format_cycle_path(.0))]
    Cycle(Vec<String>),

    /// No task is ready but unterminated tasks remain.
    #[error("scheduling deadlock: no task is ready but {} remain: {}", .remaining.len(), .remaining.join(", "))]
    Deadlock {
        /// Ids of the tasks that can never become ready.
        remaining: Vec<String>,
    },
}

/// Failures of an external capability (worker, verifier, state store).
///
/// These are infrastructure faults, terminal for the affected task. They are
/// distinct from a failing verification verdict, which is an expected,
/// retryable quality-gate outcome.
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    /// Transport-level failure (connection, HTTP status, process error).
    #[error("transport error: {0}")]
    Transport(String),

    /// The capability call exceeded its deadline.
    #[error("capability call timed out after {timeout_secs}s")]
    Timeout {
        /// The deadline that was exceeded.
        timeout_secs: u64,
    },

    /// The capability answered, but the response could not be used.
    #[error("invalid capability response: {0}")]
    InvalidResponse(String),
}

/// Top-level engine errors surfaced to the host adapter.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Graph validation or scheduling failed before/while executing.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A status change was requested that the task lifecycle forbids.
    #[error("invalid state transition for task '{task_id}': {from} -> {to}")]
    InvalidTransition {
        /// The task being transitioned.
        task_id: String,
        /// Status before the attempted transition.
        from: String,
        /// The rejected target status.
        to: String,
    },
}

/// Result alias for engine operations.
pub type DomainResult<T> = Result<T, EngineError>;
