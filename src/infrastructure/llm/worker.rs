//! Worker capability over the completion client.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::CapabilityError;
use crate::domain::ports::{WorkRequest, WorkerCapability};

use super::client::CompletionClient;

/// Worker adapter: formats a work request into a completion prompt.
pub struct LlmWorker {
    client: Arc<CompletionClient>,
    model: String,
}

impl LlmWorker {
    /// Create a worker over the given client and model.
    pub fn new(client: Arc<CompletionClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Assemble the worker prompt. Retry attempts append the prior
    /// verification feedback so each attempt is strictly more informed than
    /// the one before.
    fn build_prompt(request: &WorkRequest) -> String {
        let mut prompt = format!(
            "## TASK\n\n{}\n\n## CONTEXT\n\n- Task ID: {}\n- Attempt: {}\n- Dependencies: {}\n",
            request.instructions,
            request.task_id,
            request.attempt,
            if request.dependencies.is_empty() {
                "none".to_string()
            } else {
                request.dependencies.join(", ")
            },
        );

        if let Some(feedback) = &request.prior_feedback {
            prompt.push_str(&format!(
                "\n## PREVIOUS ATTEMPT FEEDBACK\n\nThe previous attempt scored {}/100 and failed verification.\n",
                feedback.score
            ));
            if !feedback.issues.is_empty() {
                prompt.push_str("\n**Issues:**\n");
                for issue in &feedback.issues {
                    prompt.push_str(&format!("- {issue}\n"));
                }
            }
            if !feedback.required_fixes.is_empty() {
                prompt.push_str("\n**Required Fixes:**\n");
                for fix in &feedback.required_fixes {
                    prompt.push_str(&format!("- {fix}\n"));
                }
            }
            prompt.push_str(&format!(
                "\n**Feedback:**\n{}\n\nAddress these issues in this attempt.\n",
                feedback.feedback
            ));
        }

        prompt.push_str("\nExecute the task now.");
        prompt
    }
}

#[async_trait]
impl WorkerCapability for LlmWorker {
    fn name(&self) -> &'static str {
        "llm-worker"
    }

    async fn generate(&self, request: WorkRequest) -> Result<String, CapabilityError> {
        let prompt = Self::build_prompt(&request);
        self.client
            .complete(&self.model, Some(&request.role), &prompt)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{VerificationReport, Verdict};

    fn request(attempt: u32, prior: Option<VerificationReport>) -> WorkRequest {
        WorkRequest {
            task_id: "run-1-task-1".into(),
            title: "Build it".into(),
            instructions: "Build the widget".into(),
            role: "Widget engineer".into(),
            attempt,
            dependencies: vec!["run-1-task-0".into()],
            prior_feedback: prior,
        }
    }

    #[test]
    fn first_attempt_prompt_has_no_feedback_section() {
        let prompt = LlmWorker::build_prompt(&request(1, None));
        assert!(prompt.contains("Build the widget"));
        assert!(prompt.contains("Attempt: 1"));
        assert!(prompt.contains("run-1-task-0"));
        assert!(!prompt.contains("PREVIOUS ATTEMPT FEEDBACK"));
    }

    #[test]
    fn retry_prompt_carries_feedback_and_fixes() {
        let report = VerificationReport {
            verdict: Verdict::Fail,
            score: 55,
            feedback: "Missing the flange".into(),
            issues: vec!["no flange".into()],
            required_fixes: vec!["add flange".into()],
        };
        let prompt = LlmWorker::build_prompt(&request(2, Some(report)));
        assert!(prompt.contains("scored 55/100"));
        assert!(prompt.contains("- no flange"));
        assert!(prompt.contains("- add flange"));
        assert!(prompt.contains("Missing the flange"));
    }
}
