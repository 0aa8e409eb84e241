//! Tri-state directory outcome and stage flow control

use serde::{Deserialize, Serialize};
use std::fmt;

/// The single outcome a directory pipeline run produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// The cross-boundary property held: native side passed and at least one
    /// IR module passed
    Success,
    /// A stage failed; diagnostics carry the captured tool output
    Failure { stage: String, diagnostics: String },
    /// The directory was not analyzable and no verdict applies
    Skipped { reason: String },
}

impl PipelineOutcome {
    pub fn failure(stage: &str, diagnostics: impl Into<String>) -> Self {
        Self::Failure {
            stage: stage.to_string(),
            diagnostics: diagnostics.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

impl fmt::Display for PipelineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure { stage, .. } => write!(f, "failure ({})", stage),
            Self::Skipped { reason } => write!(f, "skipped ({})", reason),
        }
    }
}

/// What a stage tells the pipeline to do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    /// Proceed to the next stage
    Continue,
    /// Stop the chain with this directory's final outcome
    Halt(PipelineOutcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_predicates() {
        assert!(PipelineOutcome::Success.is_success());
        assert!(!PipelineOutcome::Success.is_skipped());
        assert!(PipelineOutcome::skipped("no native artifact").is_skipped());
        assert!(!PipelineOutcome::failure("build", "boom").is_success());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(PipelineOutcome::Success.to_string(), "success");
        assert_eq!(
            PipelineOutcome::failure("link", "diag").to_string(),
            "failure (link)"
        );
        assert_eq!(
            PipelineOutcome::skipped("no native artifact").to_string(),
            "skipped (no native artifact)"
        );
    }

    #[test]
    fn test_outcome_serialization_roundtrip() {
        let outcome = PipelineOutcome::failure("analyze", "analyzer exited 1");
        let json = serde_json::to_string(&outcome).unwrap();

        assert!(json.contains("\"outcome\":\"failure\""));
        let parsed: PipelineOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, outcome);
    }
}
