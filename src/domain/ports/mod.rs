//! Ports: capability interfaces the engine consumes.
//!
//! The engine depends on these traits, never on concrete backends. Adapters
//! in the infrastructure layer implement them.

pub mod clock;
pub mod state_store;
pub mod verifier;
pub mod worker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use state_store::{NullStateStore, StateStore, TransitionRecord};
pub use verifier::{VerifierCapability, VerifyRequest};
pub use worker::{WorkRequest, WorkerCapability};
