//! Domain layer: models, ports, and error taxonomy.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{CapabilityError, DomainResult, EngineError, GraphError};
