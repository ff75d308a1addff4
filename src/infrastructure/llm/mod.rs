//! Completion-service adapters for the worker and verifier capabilities.

pub mod client;
pub mod mock;
pub mod verifier;
pub mod worker;

pub use client::CompletionClient;
pub use mock::{MockVerifier, MockWorker};
pub use verifier::{parse_report, LlmVerifier};
pub use worker::LlmWorker;
