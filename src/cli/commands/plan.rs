//! `mimir plan` - parse a plan and show the extracted tasks.

use std::path::PathBuf;

use anyhow::Result;
use console::style;

use crate::cli::output::plan_table;
use crate::services::PlanParser;

/// Execute the plan command.
pub fn execute(plan: PathBuf, json: bool, config_path: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config_path.as_ref())?;
    let plan_text = super::read_plan(&plan)?;

    let parsed = PlanParser::with_default_max_retries(config.engine.default_max_retries)
        .parse(&plan_text);

    if json {
        let warnings: Vec<String> = parsed.warnings.iter().map(ToString::to_string).collect();
        let value = serde_json::json!({
            "tasks": parsed.tasks,
            "warnings": warnings,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for warning in &parsed.warnings {
        eprintln!("{} {warning}", style("warning:").yellow().bold());
    }
    if parsed.is_empty() {
        println!("No tasks found in plan.");
        return Ok(());
    }

    println!(
        "{} task(s), {} warning(s):",
        parsed.tasks.len(),
        parsed.warnings.len()
    );
    println!("{}", plan_table(&parsed.tasks));
    Ok(())
}
