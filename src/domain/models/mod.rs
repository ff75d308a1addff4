//! Domain models for the Mimir engine.

pub mod config;
pub mod report;
pub mod task;
pub mod verification;

pub use config::{CompletionConfig, Config, DedupConfig, EngineConfig, LoggingConfig};
pub use report::{Disposition, HaltReason, RunReport, TaskReport};
pub use task::{AttemptRecord, Task, TaskStatus};
pub use verification::{VerificationReport, Verdict};
