//! Schema definitions for the essay grader SurrealDB tables
//!
//! Tables:
//! - rules: Persisted rule definitions (kind + parameter bag)
//! - models: Grading profiles
//! - essays: One row per (student, model, title)
//! - essay_versions: Immutable numbered essay texts
//!
//! Rows are converted to/from `storage_traits` types at the store boundary.

use chrono::{DateTime, Utc};

/// Module for serializing chrono DateTime to SurrealDB datetime format
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage_traits::{
    ContentDigest, EssayId, EssayRecord, EssayVersion, ModelId, ModelRecord, NewRule,
    ParameterBag, RuleId, RuleKind, RuleRecord, StorageResult,
};

// ---------------------------------------------------------------------------
// rules
// ---------------------------------------------------------------------------

/// Rule row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRow {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    /// Application-assigned rule id (max + 1)
    pub rule_id: u64,
    pub name: String,
    pub description: String,
    /// `RuleKind` key, e.g. "minimum_length"
    pub kind: String,
    /// Parameter bag (JSON object)
    pub parameters: serde_json::Value,
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
}

impl RuleRow {
    pub fn new(rule_id: u64, rule: NewRule) -> Self {
        RuleRow {
            id: None,
            rule_id,
            name: rule.name,
            description: rule.description,
            kind: rule.kind.as_str().to_string(),
            parameters: rule.parameters.into_value(),
            created_at: Utc::now(),
        }
    }

    pub fn into_record(self) -> StorageResult<RuleRecord> {
        let kind: RuleKind = self.kind.parse()?;
        Ok(RuleRecord {
            id: RuleId(self.rule_id),
            name: self.name,
            description: self.description,
            kind,
            parameters: ParameterBag::try_from(self.parameters)?,
            created_at: self.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// models
// ---------------------------------------------------------------------------

/// Model row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub model_id: u64,
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
}

impl ModelRow {
    pub fn new(model_id: u64, name: &str, description: &str, parameters: ParameterBag) -> Self {
        ModelRow {
            id: None,
            model_id,
            name: name.to_string(),
            description: description.to_string(),
            parameters: parameters.into_value(),
            created_at: Utc::now(),
        }
    }

    pub fn into_record(self) -> StorageResult<ModelRecord> {
        Ok(ModelRecord {
            id: ModelId(self.model_id),
            name: self.name,
            description: self.description,
            parameters: ParameterBag::try_from(self.parameters)?,
            created_at: self.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// essays / essay_versions
// ---------------------------------------------------------------------------

/// Essay row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EssayRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub essay_id: u64,
    pub student: String,
    pub model_id: u64,
    pub title: String,
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
}

impl EssayRow {
    pub fn new(essay_id: u64, student: &str, model_id: ModelId, title: &str) -> Self {
        EssayRow {
            id: None,
            essay_id,
            student: student.to_string(),
            model_id: model_id.0,
            title: title.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn into_record(self) -> EssayRecord {
        EssayRecord {
            id: EssayId(self.essay_id),
            student: self.student,
            model_id: ModelId(self.model_id),
            title: self.title,
            created_at: self.created_at,
        }
    }
}

/// Essay version row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EssayVersionRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub essay_id: u64,
    /// 1-based version number, unique per essay
    pub version: u32,
    pub text: String,
    /// SHA-256 of `text`
    pub text_digest: String,
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
}

impl EssayVersionRow {
    pub fn new(essay_id: EssayId, version: u32, text: &str) -> Self {
        EssayVersionRow {
            id: None,
            essay_id: essay_id.0,
            version,
            text: text.to_string(),
            text_digest: ContentDigest::from_bytes(text.as_bytes())
                .as_str()
                .to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn into_version(self) -> StorageResult<EssayVersion> {
        let text_digest = ContentDigest::try_from(self.text_digest)?;
        if ContentDigest::from_bytes(self.text.as_bytes()) != text_digest {
            return Err(StorageError::Backend(format!(
                "version {} of essay {} failed digest verification",
                self.version, self.essay_id
            )));
        }
        Ok(EssayVersion {
            essay_id: EssayId(self.essay_id),
            version: self.version,
            text: self.text,
            text_digest,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_rule() -> NewRule {
        NewRule {
            name: "Minimum length".to_string(),
            description: "At least N words".to_string(),
            kind: RuleKind::MinimumLength,
            parameters: ParameterBag::new().with("min_words", json!(150)),
        }
    }

    #[test]
    fn rule_row_round_trips_into_record() {
        let row = RuleRow::new(4, sample_rule());
        assert_eq!(row.kind, "minimum_length");

        let record = row.into_record().unwrap();
        assert_eq!(record.id, RuleId(4));
        assert_eq!(record.kind, RuleKind::MinimumLength);
        assert_eq!(record.parameters.get("min_words"), Some(&json!(150)));
    }

    #[test]
    fn rule_row_with_unknown_kind_is_rejected() {
        let mut row = RuleRow::new(1, sample_rule());
        row.kind = "spelling".to_string();
        assert!(row.into_record().is_err());
    }

    #[test]
    fn rule_row_serialization_omits_unset_record_id() {
        let row = RuleRow::new(1, sample_rule());
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"rule_id\":1"));
        assert!(!json.contains("\"id\""));
    }

    #[test]
    fn version_row_detects_tampered_text() {
        let mut row = EssayVersionRow::new(EssayId(1), 1, "texto original");
        row.text = "texto alterado".to_string();
        assert!(row.into_version().is_err());
    }

    #[test]
    fn version_row_into_version() {
        let row = EssayVersionRow::new(EssayId(2), 3, "texto");
        let version = row.into_version().unwrap();
        assert_eq!(version.essay_id, EssayId(2));
        assert_eq!(version.version, 3);
        assert_eq!(version.text_digest, ContentDigest::from_bytes(b"texto"));
    }
}
