//! Error taxonomy for the grading engine.

use grader_state::StorageError;

/// Failure inside a single rule's logic.
///
/// Never escapes the evaluator: it is turned into an `evaluation-error`
/// outcome for the rule that raised it.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("parameter `{key}` must be {expected}, found {found}")]
    InvalidParameter {
        key: String,
        expected: &'static str,
        found: String,
    },

    #[error("invalid keyword pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("rule panicked: {0}")]
    Panicked(String),
}

impl RuleError {
    pub(crate) fn invalid(key: &str, expected: &'static str, found: &serde_json::Value) -> Self {
        Self::InvalidParameter {
            key: key.to_string(),
            expected,
            found: found.to_string(),
        }
    }
}

/// Catalogue, storage and workflow errors surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum GraderError {
    #[error("model not found: {0}")]
    ModelNotFound(u64),

    #[error("rule not found: {0}")]
    RuleNotFound(u64),

    #[error("essay not found: {0}")]
    EssayNotFound(u64),

    #[error("essay text is empty")]
    EmptySubmission,

    #[error("malformed report: {0}")]
    MalformedReport(String),

    #[error("storage error: {0}")]
    Storage(StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for GraderError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ModelNotFound { id } => Self::ModelNotFound(id),
            StorageError::RuleNotFound { id } => Self::RuleNotFound(id),
            StorageError::EssayNotFound { id } => Self::EssayNotFound(id),
            other => Self::Storage(other),
        }
    }
}

/// Result type for grading operations.
pub type Result<T> = std::result::Result<T, GraderError>;
