//! Table rendering for parsed plans and run reports.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use console::style;

use crate::domain::models::{Disposition, RunReport, Task};

/// Create a standard list table with the given headers.
///
/// Uses the NOTHING preset (no borders) for a clean CLI aesthetic.
fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Render parsed tasks for `mimir plan`.
pub fn plan_table(tasks: &[Task]) -> String {
    let mut table = list_table(&["id", "title", "deps", "group", "retries"]);
    for task in tasks {
        table.add_row(vec![
            Cell::new(&task.plan_id),
            Cell::new(&task.title),
            Cell::new(if task.dependencies.is_empty() {
                "-".to_string()
            } else {
                task.dependencies.join(", ")
            }),
            Cell::new(
                task.concurrency_group
                    .map_or("-".to_string(), |g| g.to_string()),
            ),
            Cell::new(task.max_retries.to_string()),
        ]);
    }
    table.to_string()
}

/// Render a run report for `mimir run`.
pub fn report_table(report: &RunReport) -> String {
    let mut table = list_table(&["task", "title", "status", "score", "attempts", "reason"]);
    for row in &report.tasks {
        let (status, score, attempts, reason) = match &row.disposition {
            Disposition::Completed { score, attempts } => (
                style("completed").green().to_string(),
                score.to_string(),
                attempts.to_string(),
                String::new(),
            ),
            Disposition::Failed {
                reason,
                score,
                attempts,
            } => (
                style("failed").red().to_string(),
                score.map_or("-".to_string(), |s| s.to_string()),
                attempts.to_string(),
                reason.clone(),
            ),
            Disposition::Skipped { reason } => (
                style("skipped").yellow().to_string(),
                "-".to_string(),
                "-".to_string(),
                reason.clone(),
            ),
        };
        table.add_row(vec![
            Cell::new(&row.plan_id),
            Cell::new(&row.title),
            Cell::new(status),
            Cell::new(score),
            Cell::new(attempts),
            Cell::new(reason),
        ]);
    }
    table.to_string()
}

/// One-line run summary.
pub fn summary_line(report: &RunReport) -> String {
    let counts = format!(
        "{} total, {} completed, {} failed, {} skipped in {} wave(s), {}s",
        report.total,
        report.completed,
        report.failed,
        report.skipped,
        report.waves,
        report.duration_secs
    );
    if report.is_success() {
        format!("{} {counts}", style("ok:").green().bold())
    } else {
        format!("{} {counts}", style("halted:").red().bold())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TaskReport;

    #[test]
    fn report_table_includes_every_disposition() {
        let report = RunReport {
            run_id: "run-1".into(),
            total: 3,
            completed: 1,
            failed: 1,
            skipped: 1,
            waves: 1,
            duration_secs: 2,
            halt: None,
            tasks: vec![
                TaskReport {
                    task_id: "run-1-task-1".into(),
                    plan_id: "task-1".into(),
                    title: "One".into(),
                    disposition: Disposition::Completed { score: 90, attempts: 1 },
                    feedback: None,
                },
                TaskReport {
                    task_id: "run-1-task-2".into(),
                    plan_id: "task-2".into(),
                    title: "Two".into(),
                    disposition: Disposition::Failed {
                        reason: "verification failed".into(),
                        score: Some(40),
                        attempts: 3,
                    },
                    feedback: None,
                },
                TaskReport {
                    task_id: "run-1-task-3".into(),
                    plan_id: "task-3".into(),
                    title: "Three".into(),
                    disposition: Disposition::Skipped {
                        reason: "dependency 'task-2' failed".into(),
                    },
                    feedback: None,
                },
            ],
        };
        let rendered = report_table(&report);
        assert!(rendered.contains("task-1"));
        assert!(rendered.contains("verification failed"));
        assert!(rendered.contains("dependency 'task-2' failed"));
    }

    #[test]
    fn plan_table_shows_defaults_as_dashes() {
        let tasks = vec![Task::new("task-1", "work")];
        let rendered = plan_table(&tasks);
        assert!(rendered.contains("task-1"));
        assert!(rendered.contains('-'));
    }
}
