//! Configuration management infrastructure.
//!
//! Hierarchical configuration using figment: YAML file loading, environment
//! variable overrides, and post-extraction validation over the typed config
//! structs in the domain layer.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
