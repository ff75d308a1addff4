//! CLI type definitions.
//!
//! Clap command structures defining the `mimir` interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Parser)]
#[command(name = "mimir")]
#[command(about = "Mimir - plan-driven task orchestration with adversarial verification", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Path to a configuration file (defaults to ./mimir.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Parse, validate, and execute a plan
    Run {
        /// Path to the plan document
        plan: PathBuf,

        /// Use mock capabilities instead of the completion service
        #[arg(long)]
        dry_run: bool,
    },

    /// Parse a plan and show the extracted tasks and warnings
    Plan {
        /// Path to the plan document
        plan: PathBuf,
    },

    /// Validate a plan's dependency graph and show the execution waves
    Graph {
        /// Path to the plan document
        plan: PathBuf,
    },
}
