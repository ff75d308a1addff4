//! `mimir run` - parse, validate, and execute a plan.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use console::style;
use tokio::sync::mpsc;

use crate::cli::output::{create_spinner, render_events, report_table, summary_line};
use crate::domain::models::Verdict;
use crate::domain::ports::{StateStore, VerifierCapability, WorkerCapability};
use crate::infrastructure::llm::{
    CompletionClient, LlmVerifier, LlmWorker, MockVerifier, MockWorker,
};
use crate::infrastructure::store::TracingStateStore;
use crate::services::{Orchestrator, OrchestratorConfig, PlanParser, RequestDeduplicator};

/// Execute the run command.
pub async fn execute(
    plan: PathBuf,
    dry_run: bool,
    json: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = super::load_config(config_path.as_ref())?;
    let plan_text = super::read_plan(&plan)?;

    let model_label = if dry_run {
        "dry-run"
    } else {
        config.completion.worker_model.as_str()
    };
    let dedup =
        RequestDeduplicator::with_system_clock(Duration::from_secs(config.dedup.ttl_secs));
    dedup.check(&plan_text, model_label)?;

    let parsed = PlanParser::with_default_max_retries(config.engine.default_max_retries)
        .parse(&plan_text);
    for warning in &parsed.warnings {
        eprintln!("{} {warning}", style("warning:").yellow().bold());
    }
    if parsed.is_empty() {
        println!("No tasks found in plan; nothing to do.");
        return Ok(());
    }

    let store: Arc<dyn StateStore> = Arc::new(TracingStateStore);
    let (worker, verifier): (Arc<dyn WorkerCapability>, Arc<dyn VerifierCapability>) = if dry_run
    {
        (
            Arc::new(MockWorker::echo()),
            Arc::new(MockVerifier::always(Verdict::Pass, 95)),
        )
    } else {
        let client = Arc::new(CompletionClient::new(config.completion.clone())?);
        (
            Arc::new(LlmWorker::new(
                client.clone(),
                config.completion.worker_model.clone(),
            )),
            Arc::new(LlmVerifier::new(
                client,
                config.completion.verifier_model().to_string(),
            )),
        )
    };

    let orchestrator = Orchestrator::new(
        worker,
        verifier,
        store,
        OrchestratorConfig::from(&config.engine),
    );

    let (tx, rx) = mpsc::channel(256);
    let render = if json {
        drop(rx);
        None
    } else {
        Some(tokio::spawn(render_events(rx, create_spinner())))
    };

    let report = orchestrator.execute_with_events(parsed.tasks, tx).await?;

    if let Some(handle) = render {
        let _ = handle.await;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report_table(&report));
        println!("{}", summary_line(&report));
    }

    if !report.is_success() {
        bail!(
            "run finished with {} failed and {} skipped task(s)",
            report.failed,
            report.skipped
        );
    }
    Ok(())
}
