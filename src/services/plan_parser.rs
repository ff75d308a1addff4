//! Tolerant parser for semi-structured plan documents.
//!
//! Plans arrive from an unreliable upstream generator as markdown-ish text:
//! task segments delimited by `**Task ID:**` markers, each carrying labeled
//! fields in a permissive `**Label:** value` / `**Label:**` + body
//! convention. The parser never fails on malformed input; unusable segments
//! are dropped and reported as warnings, and an empty task list is a valid
//! result.

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::domain::models::Task;

/// Non-fatal problems encountered while parsing a plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWarning {
    /// A task segment had no usable id and was dropped.
    #[error("segment {segment} has no recognizable task id and was dropped")]
    MissingTaskId {
        /// 1-based segment index in document order.
        segment: usize,
    },

    /// A later segment reused an id; the later definition was dropped.
    #[error("duplicate task id '{task_id}'; later definition dropped")]
    DuplicateTaskId {
        /// The reused id.
        task_id: String,
    },

    /// A field value could not be interpreted; the default was used.
    #[error("task '{task_id}': unusable {field} value '{value}', using default")]
    InvalidField {
        /// Task the field belongs to.
        task_id: String,
        /// Field label.
        field: &'static str,
        /// The rejected raw value.
        value: String,
    },
}

/// Result of parsing one plan document.
#[derive(Debug, Clone, Default)]
pub struct ParsedPlan {
    /// Tasks in document order.
    pub tasks: Vec<Task>,
    /// Non-fatal problems, in the order they were found.
    pub warnings: Vec<ParseWarning>,
}

impl ParsedPlan {
    /// Whether the plan produced no work.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Field label that opens a new task segment.
const TASK_ID_LABEL: &str = "task id";

/// Tolerant plan parser.
pub struct PlanParser {
    label_re: Regex,
    id_re: Regex,
    default_max_retries: u32,
}

impl PlanParser {
    /// Create a parser with the default retry bound for tasks that omit one.
    pub fn new() -> Self {
        Self::with_default_max_retries(Task::DEFAULT_MAX_RETRIES)
    }

    /// Create a parser with an explicit default retry bound.
    pub fn with_default_max_retries(default_max_retries: u32) -> Self {
        Self {
            // A field line: `**Label:** optional inline value`.
            label_re: Regex::new(r"^\s*\*\*([A-Za-z][A-Za-z /]*?):\*\*\s*(.*)$")
                .expect("static regex"),
            id_re: Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("static regex"),
            default_max_retries,
        }
    }

    /// Parse a plan document into tasks and warnings.
    pub fn parse(&self, plan_text: &str) -> ParsedPlan {
        let mut plan = ParsedPlan::default();
        let segments = self.split_segments(plan_text);
        debug!(segments = segments.len(), "split plan into task segments");

        for (index, fields) in segments.into_iter().enumerate() {
            let segment = index + 1;
            let Some(task) = self.build_task(segment, fields, &mut plan.warnings) else {
                continue;
            };
            if plan.tasks.iter().any(|t: &Task| t.plan_id == task.plan_id) {
                plan.warnings.push(ParseWarning::DuplicateTaskId {
                    task_id: task.plan_id,
                });
                continue;
            }
            plan.tasks.push(task);
        }

        debug!(
            tasks = plan.tasks.len(),
            warnings = plan.warnings.len(),
            "plan parsing complete"
        );
        plan
    }

    /// Split the document into segments of `(label, value)` fields. A
    /// `**Task ID:**` line opens a segment; lines before the first marker
    /// are plan prose and ignored. Lines under a label accumulate into its
    /// value.
    fn split_segments(&self, plan_text: &str) -> Vec<Vec<(String, String)>> {
        let mut segments: Vec<Vec<(String, String)>> = Vec::new();

        for line in plan_text.lines() {
            if let Some(caps) = self.label_re.captures(line) {
                let label = caps[1].trim().to_lowercase();
                let inline = caps[2].trim().to_string();
                if label == TASK_ID_LABEL {
                    segments.push(vec![(label, inline)]);
                } else if let Some(fields) = segments.last_mut() {
                    fields.push((label, inline));
                }
            } else if let Some(fields) = segments.last_mut() {
                if let Some((_, value)) = fields.last_mut() {
                    if !value.is_empty() || !line.trim().is_empty() {
                        value.push('\n');
                        value.push_str(line);
                    }
                }
            }
        }

        segments
    }

    /// Assemble a task from a segment's fields, or drop the segment.
    fn build_task(
        &self,
        segment: usize,
        fields: Vec<(String, String)>,
        warnings: &mut Vec<ParseWarning>,
    ) -> Option<Task> {
        let mut id = None;
        let mut title = None;
        let mut instructions = None;
        let mut dependencies_raw = None;
        let mut group_raw = None;
        let mut retries_raw = None;
        let mut worker_role = None;
        let mut verifier_role = None;
        let mut verification_spec = None;

        for (label, value) in fields {
            let slot = match label.as_str() {
                TASK_ID_LABEL => &mut id,
                "title" => &mut title,
                "prompt" => &mut instructions,
                "dependencies" => &mut dependencies_raw,
                "parallel group" => &mut group_raw,
                "max retries" => &mut retries_raw,
                "agent role description" => &mut worker_role,
                "qc agent role description" => &mut verifier_role,
                "verification criteria" => &mut verification_spec,
                // Unknown labels are upstream noise, not errors.
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.trim().to_string());
            }
        }

        let Some(plan_id) = id.as_deref().and_then(|raw| self.normalize_id(raw)) else {
            warnings.push(ParseWarning::MissingTaskId { segment });
            return None;
        };

        let mut task = Task::new(&plan_id, instructions.unwrap_or_default())
            .with_max_retries(self.default_max_retries);

        if let Some(title) = title.filter(|t| !t.is_empty()) {
            task = task.with_title(title);
        }

        if let Some(raw) = dependencies_raw {
            task.dependencies = self.parse_dependencies(&raw);
        }

        if let Some(raw) = group_raw.filter(|v| !v.is_empty()) {
            match raw.parse::<i64>() {
                Ok(group) => task.concurrency_group = Some(group),
                Err(_) => warnings.push(ParseWarning::InvalidField {
                    task_id: plan_id.clone(),
                    field: "parallel group",
                    value: raw,
                }),
            }
        }

        if let Some(raw) = retries_raw.filter(|v| !v.is_empty()) {
            match raw.parse::<u32>() {
                Ok(retries) => task.max_retries = retries,
                Err(_) => warnings.push(ParseWarning::InvalidField {
                    task_id: plan_id.clone(),
                    field: "max retries",
                    value: raw,
                }),
            }
        }

        if let Some(role) = worker_role.filter(|v| !v.is_empty()) {
            task.worker_role = role;
        }
        if let Some(role) = verifier_role.filter(|v| !v.is_empty()) {
            task.verifier_role = role;
        }
        if let Some(spec) = verification_spec.filter(|v| !v.is_empty()) {
            task.verification_spec = spec;
        }

        Some(task)
    }

    /// Normalize a raw id value: strip markdown decoration, collapse inner
    /// whitespace to dashes, and require a plain identifier shape.
    fn normalize_id(&self, raw: &str) -> Option<String> {
        let cleaned = raw.trim_matches(|c: char| c == '`' || c == '*' || c.is_whitespace());
        if cleaned.is_empty() {
            return None;
        }
        let id = cleaned
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");
        self.id_re.is_match(&id).then_some(id)
    }

    /// Parse a comma-separated dependency list. The literal tokens "none"
    /// and "n/a" mean no dependencies.
    fn parse_dependencies(&self, raw: &str) -> Vec<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed.eq_ignore_ascii_case("n/a")
        {
            return Vec::new();
        }
        trimmed
            .split(',')
            .filter_map(|part| self.normalize_id(part))
            .collect()
    }
}

impl Default for PlanParser {
    fn default() -> Self {
        Self::new()
    }
}
