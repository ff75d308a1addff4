//! Verifier capability over the completion client.
//!
//! The completion service answers in markdown; this adapter turns that text
//! into the structured report the engine requires. Parsing is tolerant
//! across the answer shapes verifiers actually produce, and an answer that
//! matches no pattern parses as a failing report rather than an error, so a
//! sloppy verifier costs an attempt, not the task.

use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::domain::errors::CapabilityError;
use crate::domain::models::{VerificationReport, Verdict};
use crate::domain::ports::{VerifierCapability, VerifyRequest};

use super::client::CompletionClient;

/// Inline form: `verdict: PASS` / `Verdict: "FAIL"`.
static VERDICT_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)verdict:\s*["']?\**(PASS|FAIL)"#).expect("static regex")
});

/// Heading form: `### 1. Verdict` followed by `**PASS**`.
static VERDICT_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)###\s*\d+\.\s*Verdict\s*\n\s*\*\*(PASS|FAIL)\*\*").expect("static regex")
});

/// Loose form: `Verdict` anywhere, then a bold `**PASS**`.
static VERDICT_LOOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)Verdict.*?\*\*(PASS|FAIL)\*\*").expect("static regex")
});

/// Inline form: `score: 87` / `Score: **87**`.
static SCORE_INLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)score:\s*[*\s]*(\d+)").expect("static regex"));

/// Heading form: `### 2. Score` followed by `**87**`.
static SCORE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)###\s*\d+\.\s*Score\s*\n\s*\*\*(\d+)\*\*").expect("static regex")
});

/// Bullet lines harvested as issues.
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[-*]\s+(.+)$").expect("static regex"));

/// Most issues/fixes kept from one answer.
const MAX_ISSUES: usize = 5;
/// Feedback excerpt length.
const FEEDBACK_CHARS: usize = 500;

/// Parse a verifier answer into a structured report.
///
/// Missing verdict parses as `Fail`; missing score as 0. Scores above 100
/// are clamped.
pub fn parse_report(answer: &str) -> VerificationReport {
    let verdict = VERDICT_INLINE
        .captures(answer)
        .or_else(|| VERDICT_HEADING.captures(answer))
        .or_else(|| VERDICT_LOOSE.captures(answer))
        .and_then(|caps| Verdict::from_str(&caps[1]))
        .unwrap_or(Verdict::Fail);

    let score = SCORE_INLINE
        .captures(answer)
        .or_else(|| SCORE_HEADING.captures(answer))
        .and_then(|caps| caps[1].parse::<u64>().ok())
        .map_or(0, |s| s.min(100) as u8);

    let issues: Vec<String> = BULLET
        .captures_iter(answer)
        .take(MAX_ISSUES)
        .map(|caps| caps[1].trim().to_string())
        .collect();

    VerificationReport {
        verdict,
        score,
        feedback: answer.chars().take(FEEDBACK_CHARS).collect(),
        required_fixes: issues.clone(),
        issues,
    }
}

/// Verifier adapter: formats the verification prompt and parses the answer.
pub struct LlmVerifier {
    client: Arc<CompletionClient>,
    model: String,
}

impl LlmVerifier {
    /// Create a verifier over the given client and model.
    pub fn new(client: Arc<CompletionClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn build_prompt(request: &VerifyRequest) -> String {
        format!(
            "## TASK REQUIREMENTS\n\n{}\n\n## WORKER OUTPUT\n\n{}\n\n## VERIFICATION CRITERIA\n\n{}\n\n\
             Verify the worker's output now. Provide:\n\
             1. verdict: \"PASS\" or \"FAIL\"\n\
             2. score: 0-100\n\
             3. feedback: 2-3 sentences\n\
             4. issues: list of specific problems (if any)\n\
             5. requiredFixes: list of what needs to be fixed (if any)\n\n\
             Output as structured markdown.",
            request.instructions, request.output, request.spec
        )
    }
}

#[async_trait]
impl VerifierCapability for LlmVerifier {
    fn name(&self) -> &'static str {
        "llm-verifier"
    }

    async fn verify(&self, request: VerifyRequest) -> Result<VerificationReport, CapabilityError> {
        let prompt = Self::build_prompt(&request);
        let answer = self
            .client
            .complete(&self.model, Some(&request.role), &prompt)
            .await?;
        Ok(parse_report(&answer))
    }
}
