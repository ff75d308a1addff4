//! Mimir CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mimir::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { plan, dry_run } => {
            mimir::cli::commands::run::execute(plan, dry_run, cli.json, cli.config).await
        }
        Commands::Plan { plan } => mimir::cli::commands::plan::execute(plan, cli.json, cli.config),
        Commands::Graph { plan } => {
            mimir::cli::commands::graph::execute(plan, cli.json, cli.config)
        }
    };

    if let Err(err) = result {
        mimir::cli::handle_error(err, cli.json);
    }
}
