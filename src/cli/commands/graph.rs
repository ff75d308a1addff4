//! `mimir graph` - validate a plan's dependency graph and preview waves.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use anyhow::Result;
use console::style;

use crate::domain::models::Task;
use crate::services::{next_wave, partition_groups, PlanParser, TaskGraph};

/// Execute the graph command.
pub fn execute(plan: PathBuf, json: bool, config_path: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config_path.as_ref())?;
    let plan_text = super::read_plan(&plan)?;

    let parsed = PlanParser::with_default_max_retries(config.engine.default_max_retries)
        .parse(&plan_text);
    if parsed.is_empty() {
        println!("No tasks found in plan.");
        return Ok(());
    }

    let graph = TaskGraph::build(&parsed.tasks);
    graph.validate()?;

    let waves = preview_waves(&graph);

    if json {
        println!("{}", serde_json::to_string_pretty(&waves)?);
        return Ok(());
    }

    let tasks: BTreeMap<String, Task> = parsed
        .tasks
        .into_iter()
        .map(|t| (t.id.clone(), t))
        .collect();

    println!(
        "{} {} task(s) across {} wave(s)",
        style("valid:").green().bold(),
        graph.len(),
        waves.len()
    );
    for (index, wave) in waves.iter().enumerate() {
        println!("wave {}:", index + 1);
        for (group, members) in partition_groups(wave, &tasks) {
            let ids: Vec<&str> = members.iter().map(|t| t.plan_id.as_str()).collect();
            match group {
                Some(group) => println!("  group {group}: {}", ids.join(", ")),
                None => println!("  {}", ids.join(", ")),
            }
        }
    }
    Ok(())
}

/// Simulate wave progression assuming every task completes.
fn preview_waves(graph: &TaskGraph) -> Vec<Vec<String>> {
    let mut waves = Vec::new();
    let mut completed: HashSet<String> = HashSet::new();

    loop {
        let wave = next_wave(graph, &completed, &completed);
        if wave.is_empty() {
            break;
        }
        completed.extend(wave.iter().cloned());
        waves.push(wave);
    }
    waves
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_orders_waves_by_dependency_depth() {
        let tasks = vec![
            Task::new("task-1", "a"),
            Task::new("task-2", "b").with_dependencies(vec!["task-1".into()]),
            Task::new("task-3", "c").with_dependencies(vec!["task-1".into()]),
            Task::new("task-4", "d")
                .with_dependencies(vec!["task-2".into(), "task-3".into()]),
        ];
        let graph = TaskGraph::build(&tasks);
        let waves = preview_waves(&graph);
        assert_eq!(
            waves,
            vec![
                vec!["task-1".to_string()],
                vec!["task-2".to_string(), "task-3".to_string()],
                vec!["task-4".to_string()],
            ]
        );
    }
}
