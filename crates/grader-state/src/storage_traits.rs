//! Storage trait definitions for the essay grader
//!
//! These traits define the storage abstractions the rule engine consumes:
//! - `RuleStore`: persisted rule definitions and their parameter bags
//! - `ModelStore`: grading profiles (models) with per-kind overrides
//! - `EssayStore`: essays and their immutable, numbered versions
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::Sha256;

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                $name(id)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a persisted rule (assigned by the store, starting at 1)
    RuleId
);
numeric_id!(
    /// Identifier of a grading model
    ModelId
);
numeric_id!(
    /// Identifier of an essay (student + model + title)
    EssayId
);

/// Content digest (SHA-256 hex string).
///
/// The inner field is private to guarantee the string is always valid
/// lowercase hex produced by `from_bytes` or validated via `TryFrom<String>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Compute the SHA-256 digest of the given bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::Digest;
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentDigest(hex::encode(hasher.finalize()))
    }

    /// Return the full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = StorageError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StorageError::InvalidDigest { digest: s });
        }
        Ok(ContentDigest(s.to_ascii_lowercase()))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Rule definitions
// ---------------------------------------------------------------------------

/// The capability a persisted rule exercises.
///
/// The engine dispatches on this value; the display name of a rule is free
/// text and never used for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    NormCompliance,
    ThemeAdequacy,
    EssayStructure,
    ArgumentPertinence,
    Cohesion,
    VocabularyRepetition,
    Referencing,
    InterventionProposal,
    MinimumLength,
    FirstPerson,
}

impl RuleKind {
    /// Every kind, in canonical catalogue order.
    pub const ALL: [RuleKind; 10] = [
        RuleKind::NormCompliance,
        RuleKind::ThemeAdequacy,
        RuleKind::EssayStructure,
        RuleKind::ArgumentPertinence,
        RuleKind::Cohesion,
        RuleKind::VocabularyRepetition,
        RuleKind::Referencing,
        RuleKind::InterventionProposal,
        RuleKind::MinimumLength,
        RuleKind::FirstPerson,
    ];

    /// Stable snake_case key, as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::NormCompliance => "norm_compliance",
            RuleKind::ThemeAdequacy => "theme_adequacy",
            RuleKind::EssayStructure => "essay_structure",
            RuleKind::ArgumentPertinence => "argument_pertinence",
            RuleKind::Cohesion => "cohesion",
            RuleKind::VocabularyRepetition => "vocabulary_repetition",
            RuleKind::Referencing => "referencing",
            RuleKind::InterventionProposal => "intervention_proposal",
            RuleKind::MinimumLength => "minimum_length",
            RuleKind::FirstPerson => "first_person",
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RuleKind {
    type Err = StorageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        RuleKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| StorageError::InvalidParameters {
                reason: format!("unknown rule kind: {s}"),
            })
    }
}

/// Option name → JSON value mapping attached to rules and models.
///
/// May be empty. Missing keys are resolved by the reader with documented
/// defaults; the bag itself carries no schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterBag(Map<String, Value>);

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Overlay `other` on top of `self`; keys in `other` win.
    pub fn merged_with(&self, other: &ParameterBag) -> ParameterBag {
        let mut merged = self.0.clone();
        for (k, v) in other.iter() {
            merged.insert(k.clone(), v.clone());
        }
        ParameterBag(merged)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for ParameterBag {
    fn from(map: Map<String, Value>) -> Self {
        ParameterBag(map)
    }
}

impl TryFrom<Value> for ParameterBag {
    type Error = StorageError;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(ParameterBag(map)),
            Value::Null => Ok(ParameterBag::default()),
            other => Err(StorageError::InvalidParameters {
                reason: format!("expected a JSON object, got {other}"),
            }),
        }
    }
}

/// A rule definition as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub id: RuleId,
    pub name: String,
    pub description: String,
    pub kind: RuleKind,
    pub parameters: ParameterBag,
    pub created_at: DateTime<Utc>,
}

/// Input for `RuleStore::insert_rule`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRule {
    pub name: String,
    pub description: String,
    pub kind: RuleKind,
    pub parameters: ParameterBag,
}

/// Partial update for `RuleStore::update_rule`; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parameters: Option<ParameterBag>,
}

/// Persisted rule definitions.
///
/// Guarantees:
/// - `fetch_rules` returns records in id order (insertion order).
/// - `insert_rule` never deduplicates; idempotent seeding is the caller's job.
/// - A parameter bag written and re-fetched compares equal.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// All rule records, ordered by id. May be empty.
    async fn fetch_rules(&self) -> StorageResult<Vec<RuleRecord>>;

    /// Insert a rule and return its assigned id.
    async fn insert_rule(&self, rule: NewRule) -> StorageResult<RuleId>;

    /// Fetch one rule. Returns `StorageError::RuleNotFound` if absent.
    async fn fetch_rule(&self, id: RuleId) -> StorageResult<RuleRecord>;

    /// Fetch only the parameter bag of a rule.
    async fn fetch_rule_parameters_by_id(&self, id: RuleId) -> StorageResult<ParameterBag> {
        Ok(self.fetch_rule(id).await?.parameters)
    }

    /// Apply a partial update. Returns the updated record.
    async fn update_rule(&self, id: RuleId, patch: RulePatch) -> StorageResult<RuleRecord>;

    /// Delete a rule. Returns `StorageError::RuleNotFound` if absent.
    async fn delete_rule(&self, id: RuleId) -> StorageResult<()>;

    /// Number of persisted rules.
    async fn count_rules(&self) -> StorageResult<u64>;
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// A grading profile. Its parameters may hold per-kind overrides keyed by
/// `RuleKind::as_str()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub id: ModelId,
    pub name: String,
    pub description: String,
    pub parameters: ParameterBag,
    pub created_at: DateTime<Utc>,
}

/// Grading model registry.
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Create a model and return its assigned id.
    async fn create_model(
        &self,
        name: &str,
        description: &str,
        parameters: ParameterBag,
    ) -> StorageResult<ModelId>;

    /// Fetch one model. Returns `StorageError::ModelNotFound` if absent.
    async fn get_model(&self, id: ModelId) -> StorageResult<ModelRecord>;

    /// All models ordered by id.
    async fn list_models(&self) -> StorageResult<Vec<ModelRecord>>;

    /// Replace a model's parameter bag.
    async fn update_model_parameters(
        &self,
        id: ModelId,
        parameters: ParameterBag,
    ) -> StorageResult<ModelRecord>;
}

// ---------------------------------------------------------------------------
// Essays
// ---------------------------------------------------------------------------

/// An essay, identified by (student, model, title)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssayRecord {
    pub id: EssayId,
    pub student: String,
    pub model_id: ModelId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// One immutable saved version of an essay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssayVersion {
    pub essay_id: EssayId,
    /// 1-based, monotonically increasing per essay
    pub version: u32,
    pub text: String,
    pub text_digest: ContentDigest,
    pub created_at: DateTime<Utc>,
}

/// Essay and version persistence.
///
/// Guarantees:
/// - `find_or_create_essay` returns the same id for the same
///   (student, model, title) triple.
/// - `append_version` numbers versions `max + 1`, starting at 1.
/// - Versions are never mutated; an essay is only removed as a whole.
#[async_trait]
pub trait EssayStore: Send + Sync {
    /// Look up the essay for a (student, model, title) triple.
    async fn find_essay(
        &self,
        student: &str,
        model_id: ModelId,
        title: &str,
    ) -> StorageResult<Option<EssayRecord>>;

    async fn find_or_create_essay(
        &self,
        student: &str,
        model_id: ModelId,
        title: &str,
    ) -> StorageResult<EssayRecord>;

    /// Fetch one essay. Returns `StorageError::EssayNotFound` if absent.
    async fn get_essay(&self, id: EssayId) -> StorageResult<EssayRecord>;

    /// Append a new version. Fails with `EssayNotFound` for unknown essays.
    async fn append_version(&self, essay_id: EssayId, text: &str) -> StorageResult<EssayVersion>;

    /// All versions of an essay, oldest first.
    async fn list_versions(&self, essay_id: EssayId) -> StorageResult<Vec<EssayVersion>>;

    /// Remove an essay together with its versions.
    async fn delete_essay(&self, id: EssayId) -> StorageResult<()>;
}
