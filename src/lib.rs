//! Mimir - plan-driven task orchestration.
//!
//! Mimir turns a semi-structured task plan into a dependency graph, executes
//! the graph in parallel waves, and gates every task's completion behind an
//! adversarial verification step with bounded, feedback-driven retries.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - **Domain Layer** (`domain`): task/report models, capability ports, and
//!   the error taxonomy
//! - **Service Layer** (`services`): plan parsing, graph validation, wave
//!   scheduling, the per-task retry state machine, and the orchestration
//!   controller
//! - **Infrastructure Layer** (`infrastructure`): configuration loading and
//!   adapters for the completion service and state store
//! - **CLI Layer** (`cli`): the thin host adapter
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mimir::domain::ports::NullStateStore;
//! use mimir::infrastructure::llm::{MockVerifier, MockWorker};
//! use mimir::services::{Orchestrator, OrchestratorConfig, PlanParser};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let parsed = PlanParser::new().parse("**Task ID:** task-1\n**Prompt:**\nSay hello.\n");
//!     let orchestrator = Orchestrator::new(
//!         Arc::new(MockWorker::echo()),
//!         Arc::new(MockVerifier::always(mimir::domain::models::Verdict::Pass, 95)),
//!         Arc::new(NullStateStore),
//!         OrchestratorConfig::default(),
//!     );
//!     let report = orchestrator.execute(parsed.tasks).await?;
//!     println!("{} completed", report.completed);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{CapabilityError, DomainResult, EngineError, GraphError};
pub use domain::models::{
    Config, Disposition, EngineConfig, HaltReason, RunReport, Task, TaskReport, TaskStatus,
    VerificationReport, Verdict,
};
pub use domain::ports::{
    Clock, NullStateStore, StateStore, TransitionRecord, VerifierCapability, VerifyRequest,
    WorkRequest, WorkerCapability,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    EngineEvent, Orchestrator, OrchestratorConfig, ParsedPlan, PlanParser, RequestDeduplicator,
    TaskGraph, TaskRunner,
};
