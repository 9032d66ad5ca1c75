//! Per-rule evaluation results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of one rule applied to one text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    Ok,
    Violation,
    EvaluationError,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Violation => "violation",
            Self::EvaluationError => "evaluation-error",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of applying one rule: name, status and an explanatory comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: String,
    pub status: OutcomeStatus,
    pub comment: String,
}

impl RuleOutcome {
    pub fn ok(rule: impl Into<String>, comment: impl Into<String>) -> Self {
        Self::new(rule, OutcomeStatus::Ok, comment)
    }

    pub fn violation(rule: impl Into<String>, comment: impl Into<String>) -> Self {
        Self::new(rule, OutcomeStatus::Violation, comment)
    }

    pub fn evaluation_error(rule: impl Into<String>, comment: impl Into<String>) -> Self {
        Self::new(rule, OutcomeStatus::EvaluationError, comment)
    }

    fn new(rule: impl Into<String>, status: OutcomeStatus, comment: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            status,
            comment: comment.into(),
        }
    }
}

/// A rule outcome with the points it earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredOutcome {
    #[serde(flatten)]
    pub outcome: RuleOutcome,
    pub points: u32,
    pub max: u32,
}
