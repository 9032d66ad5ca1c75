//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryRuleStore`, `MemoryModelStore`, and `MemoryEssayStore`
//! that satisfy the trait contracts without any external dependencies.
//! `MemoryStore` bundles all three for callers that need a single value.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StorageError;
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryRuleStore
// ---------------------------------------------------------------------------

/// In-memory rule store backed by a `BTreeMap<id, RuleRecord>` (id order).
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    rules: Mutex<BTreeMap<u64, RuleRecord>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn fetch_rules(&self) -> StorageResult<Vec<RuleRecord>> {
        let rules = self.rules.lock().unwrap();
        Ok(rules.values().cloned().collect())
    }

    async fn insert_rule(&self, rule: NewRule) -> StorageResult<RuleId> {
        let mut rules = self.rules.lock().unwrap();
        let id = rules.keys().next_back().copied().unwrap_or(0) + 1;
        rules.insert(
            id,
            RuleRecord {
                id: RuleId(id),
                name: rule.name,
                description: rule.description,
                kind: rule.kind,
                parameters: rule.parameters,
                created_at: Utc::now(),
            },
        );
        Ok(RuleId(id))
    }

    async fn fetch_rule(&self, id: RuleId) -> StorageResult<RuleRecord> {
        let rules = self.rules.lock().unwrap();
        rules
            .get(&id.0)
            .cloned()
            .ok_or(StorageError::RuleNotFound { id: id.0 })
    }

    async fn update_rule(&self, id: RuleId, patch: RulePatch) -> StorageResult<RuleRecord> {
        let mut rules = self.rules.lock().unwrap();
        let record = rules
            .get_mut(&id.0)
            .ok_or(StorageError::RuleNotFound { id: id.0 })?;
        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(description) = patch.description {
            record.description = description;
        }
        if let Some(parameters) = patch.parameters {
            record.parameters = parameters;
        }
        Ok(record.clone())
    }

    async fn delete_rule(&self, id: RuleId) -> StorageResult<()> {
        let mut rules = self.rules.lock().unwrap();
        rules
            .remove(&id.0)
            .map(|_| ())
            .ok_or(StorageError::RuleNotFound { id: id.0 })
    }

    async fn count_rules(&self) -> StorageResult<u64> {
        let rules = self.rules.lock().unwrap();
        Ok(rules.len() as u64)
    }
}

// ---------------------------------------------------------------------------
// MemoryModelStore
// ---------------------------------------------------------------------------

/// In-memory model registry backed by a `BTreeMap<id, ModelRecord>`.
#[derive(Debug, Default)]
pub struct MemoryModelStore {
    models: Mutex<BTreeMap<u64, ModelRecord>>,
}

impl MemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModelStore for MemoryModelStore {
    async fn create_model(
        &self,
        name: &str,
        description: &str,
        parameters: ParameterBag,
    ) -> StorageResult<ModelId> {
        let mut models = self.models.lock().unwrap();
        let id = models.keys().next_back().copied().unwrap_or(0) + 1;
        models.insert(
            id,
            ModelRecord {
                id: ModelId(id),
                name: name.to_string(),
                description: description.to_string(),
                parameters,
                created_at: Utc::now(),
            },
        );
        Ok(ModelId(id))
    }

    async fn get_model(&self, id: ModelId) -> StorageResult<ModelRecord> {
        let models = self.models.lock().unwrap();
        models
            .get(&id.0)
            .cloned()
            .ok_or(StorageError::ModelNotFound { id: id.0 })
    }

    async fn list_models(&self) -> StorageResult<Vec<ModelRecord>> {
        let models = self.models.lock().unwrap();
        Ok(models.values().cloned().collect())
    }

    async fn update_model_parameters(
        &self,
        id: ModelId,
        parameters: ParameterBag,
    ) -> StorageResult<ModelRecord> {
        let mut models = self.models.lock().unwrap();
        let record = models
            .get_mut(&id.0)
            .ok_or(StorageError::ModelNotFound { id: id.0 })?;
        record.parameters = parameters;
        Ok(record.clone())
    }
}

// ---------------------------------------------------------------------------
// MemoryEssayStore
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct EssayState {
    record: EssayRecord,
    versions: Vec<EssayVersion>,
}

/// In-memory essay store; versions live alongside their essay.
#[derive(Debug, Default)]
pub struct MemoryEssayStore {
    essays: Mutex<BTreeMap<u64, EssayState>>,
}

impl MemoryEssayStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn find_by_identity<'a>(
    essays: &'a BTreeMap<u64, EssayState>,
    student: &str,
    model_id: ModelId,
    title: &str,
) -> Option<&'a EssayRecord> {
    essays
        .values()
        .map(|s| &s.record)
        .find(|r| r.student == student && r.model_id == model_id && r.title == title)
}

#[async_trait]
impl EssayStore for MemoryEssayStore {
    async fn find_essay(
        &self,
        student: &str,
        model_id: ModelId,
        title: &str,
    ) -> StorageResult<Option<EssayRecord>> {
        let essays = self.essays.lock().unwrap();
        Ok(find_by_identity(&essays, student, model_id, title).cloned())
    }

    async fn find_or_create_essay(
        &self,
        student: &str,
        model_id: ModelId,
        title: &str,
    ) -> StorageResult<EssayRecord> {
        let mut essays = self.essays.lock().unwrap();
        if let Some(existing) = find_by_identity(&essays, student, model_id, title) {
            return Ok(existing.clone());
        }

        let id = essays.keys().next_back().copied().unwrap_or(0) + 1;
        let record = EssayRecord {
            id: EssayId(id),
            student: student.to_string(),
            model_id,
            title: title.to_string(),
            created_at: Utc::now(),
        };
        essays.insert(
            id,
            EssayState {
                record: record.clone(),
                versions: Vec::new(),
            },
        );
        Ok(record)
    }

    async fn get_essay(&self, id: EssayId) -> StorageResult<EssayRecord> {
        let essays = self.essays.lock().unwrap();
        essays
            .get(&id.0)
            .map(|s| s.record.clone())
            .ok_or(StorageError::EssayNotFound { id: id.0 })
    }

    async fn append_version(&self, essay_id: EssayId, text: &str) -> StorageResult<EssayVersion> {
        let mut essays = self.essays.lock().unwrap();
        let state = essays
            .get_mut(&essay_id.0)
            .ok_or(StorageError::EssayNotFound { id: essay_id.0 })?;
        let next = state.versions.iter().map(|v| v.version).max().unwrap_or(0) + 1;
        let version = EssayVersion {
            essay_id,
            version: next,
            text: text.to_string(),
            text_digest: ContentDigest::from_bytes(text.as_bytes()),
            created_at: Utc::now(),
        };
        state.versions.push(version.clone());
        Ok(version)
    }

    async fn list_versions(&self, essay_id: EssayId) -> StorageResult<Vec<EssayVersion>> {
        let essays = self.essays.lock().unwrap();
        let state = essays
            .get(&essay_id.0)
            .ok_or(StorageError::EssayNotFound { id: essay_id.0 })?;
        let mut versions = state.versions.clone();
        versions.sort_by_key(|v| v.version);
        Ok(versions)
    }

    async fn delete_essay(&self, id: EssayId) -> StorageResult<()> {
        let mut essays = self.essays.lock().unwrap();
        essays
            .remove(&id.0)
            .map(|_| ())
            .ok_or(StorageError::EssayNotFound { id: id.0 })
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// All three in-memory stores behind one value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub rules: MemoryRuleStore,
    pub models: MemoryModelStore,
    pub essays: MemoryEssayStore,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RuleStore for MemoryStore {
    async fn fetch_rules(&self) -> StorageResult<Vec<RuleRecord>> {
        self.rules.fetch_rules().await
    }

    async fn insert_rule(&self, rule: NewRule) -> StorageResult<RuleId> {
        self.rules.insert_rule(rule).await
    }

    async fn fetch_rule(&self, id: RuleId) -> StorageResult<RuleRecord> {
        self.rules.fetch_rule(id).await
    }

    async fn update_rule(&self, id: RuleId, patch: RulePatch) -> StorageResult<RuleRecord> {
        self.rules.update_rule(id, patch).await
    }

    async fn delete_rule(&self, id: RuleId) -> StorageResult<()> {
        self.rules.delete_rule(id).await
    }

    async fn count_rules(&self) -> StorageResult<u64> {
        self.rules.count_rules().await
    }
}

#[async_trait]
impl ModelStore for MemoryStore {
    async fn create_model(
        &self,
        name: &str,
        description: &str,
        parameters: ParameterBag,
    ) -> StorageResult<ModelId> {
        self.models.create_model(name, description, parameters).await
    }

    async fn get_model(&self, id: ModelId) -> StorageResult<ModelRecord> {
        self.models.get_model(id).await
    }

    async fn list_models(&self) -> StorageResult<Vec<ModelRecord>> {
        self.models.list_models().await
    }

    async fn update_model_parameters(
        &self,
        id: ModelId,
        parameters: ParameterBag,
    ) -> StorageResult<ModelRecord> {
        self.models.update_model_parameters(id, parameters).await
    }
}

#[async_trait]
impl EssayStore for MemoryStore {
    async fn find_essay(
        &self,
        student: &str,
        model_id: ModelId,
        title: &str,
    ) -> StorageResult<Option<EssayRecord>> {
        self.essays.find_essay(student, model_id, title).await
    }

    async fn find_or_create_essay(
        &self,
        student: &str,
        model_id: ModelId,
        title: &str,
    ) -> StorageResult<EssayRecord> {
        self.essays
            .find_or_create_essay(student, model_id, title)
            .await
    }

    async fn get_essay(&self, id: EssayId) -> StorageResult<EssayRecord> {
        self.essays.get_essay(id).await
    }

    async fn append_version(&self, essay_id: EssayId, text: &str) -> StorageResult<EssayVersion> {
        self.essays.append_version(essay_id, text).await
    }

    async fn list_versions(&self, essay_id: EssayId) -> StorageResult<Vec<EssayVersion>> {
        self.essays.list_versions(essay_id).await
    }

    async fn delete_essay(&self, id: EssayId) -> StorageResult<()> {
        self.essays.delete_essay(id).await
    }
}
