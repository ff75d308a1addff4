//! Verification verdict model.
//!
//! A verifier judges a worker's output against the task's verification
//! criteria and returns a structured report. Completion is gated on the
//! report, never on the worker output alone.

use serde::{Deserialize, Serialize};

/// Binary judgment from the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Output meets the verification criteria.
    Pass,
    /// Output does not meet the verification criteria.
    Fail,
}

impl Verdict {
    /// String form used in logs and stored records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }

    /// Parse a verdict token, tolerating case.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pass" | "passed" => Some(Self::Pass),
            "fail" | "failed" => Some(Self::Fail),
            _ => None,
        }
    }
}

/// Structured result of one verification step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Pass/fail judgment.
    pub verdict: Verdict,
    /// Quality score in 0..=100.
    pub score: u8,
    /// Free-text assessment.
    pub feedback: String,
    /// Specific problems found.
    pub issues: Vec<String>,
    /// What must change before the next attempt can pass.
    pub required_fixes: Vec<String>,
}

impl VerificationReport {
    /// Whether this report completes the task.
    ///
    /// Both conditions are required: a `Pass` verdict with a score below the
    /// threshold does not pass, and neither does a high score under a `Fail`
    /// verdict. This guards against verifiers whose verdict and score
    /// disagree.
    pub fn passes(&self, threshold: u8) -> bool {
        self.verdict == Verdict::Pass && self.score >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(verdict: Verdict, score: u8) -> VerificationReport {
        VerificationReport {
            verdict,
            score,
            feedback: String::new(),
            issues: vec![],
            required_fixes: vec![],
        }
    }

    #[test]
    fn pass_requires_both_verdict_and_score() {
        assert!(report(Verdict::Pass, 80).passes(80));
        assert!(report(Verdict::Pass, 100).passes(80));
        assert!(!report(Verdict::Pass, 79).passes(80));
        assert!(!report(Verdict::Fail, 95).passes(80));
        assert!(!report(Verdict::Fail, 0).passes(80));
    }

    #[test]
    fn verdict_parses_tolerantly() {
        assert_eq!(Verdict::from_str("PASS"), Some(Verdict::Pass));
        assert_eq!(Verdict::from_str("Fail"), Some(Verdict::Fail));
        assert_eq!(Verdict::from_str("passed"), Some(Verdict::Pass));
        assert_eq!(Verdict::from_str("maybe"), None);
    }
}
