//! CLI command implementations.

pub mod graph;
pub mod plan;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

/// Load configuration from an explicit file or the default search path.
pub(crate) fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Read a plan document from disk.
pub(crate) fn read_plan(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read plan file {}", path.display()))
}
