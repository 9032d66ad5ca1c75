//! Error types for grader-state

use thiserror::Error;

/// Errors raised while connecting to or preparing the backing database
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),

    /// Configuration error (missing or malformed settings)
    #[error("Invalid store configuration: {0}")]
    Config(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Serialization(err.to_string())
    }
}

/// Errors returned by the storage traits
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("rule not found: {id}")]
    RuleNotFound { id: u64 },

    #[error("model not found: {id}")]
    ModelNotFound { id: u64 },

    #[error("essay not found: {id}")]
    EssayNotFound { id: u64 },

    #[error("invalid content digest: {digest}")]
    InvalidDigest { digest: String },

    #[error("invalid parameter bag: {reason}")]
    InvalidParameters { reason: String },

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<surrealdb::Error> for StorageError {
    fn from(err: surrealdb::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl From<StateError> for StorageError {
    fn from(err: StateError) -> Self {
        StorageError::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_errors_name_the_id() {
        let err = StorageError::RuleNotFound { id: 7 };
        assert_eq!(err.to_string(), "rule not found: 7");

        let err = StorageError::ModelNotFound { id: 3 };
        assert!(err.to_string().contains("model not found"));
    }

    #[test]
    fn state_error_converts_into_backend_error() {
        let err: StorageError = StateError::SchemaSetup("boom".to_string()).into();
        assert!(matches!(err, StorageError::Backend(ref msg) if msg.contains("boom")));
    }
}
