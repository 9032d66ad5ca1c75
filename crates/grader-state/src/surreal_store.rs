//! SurrealDB-backed store
//!
//! Implements `RuleStore`, `ModelStore` and `EssayStore` over one connection,
//! using the `schema` row types for persistence and converting to/from
//! `storage_traits` types at the boundary.
//!
//! Supports in-memory, embedded (surrealkv) and remote (WebSocket) endpoints.

use async_trait::async_trait;
use serde::Deserialize;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use crate::config::StoreConfig;
use crate::error::{StateError, StorageError};
use crate::migrations;
use crate::schema::{EssayRow, EssayVersionRow, ModelRow, RuleRow};
use crate::storage_traits::{
    EssayId, EssayRecord, EssayStore, EssayVersion, ModelId, ModelRecord, ModelStore, NewRule,
    ParameterBag, RuleId, RulePatch, RuleRecord, RuleStore, StorageResult,
};

#[derive(Debug, Deserialize)]
struct CountRow {
    count: u64,
}

/// SurrealDB-backed implementation of all storage traits.
#[derive(Clone)]
pub struct SurrealStore {
    db: Surreal<Any>,
}

impl SurrealStore {
    /// Connect according to `config` and initialise the schema.
    #[instrument(skip(config), fields(endpoint = %config.endpoint, namespace = %config.namespace, database = %config.database))]
    pub async fn connect(config: &StoreConfig) -> crate::Result<Self> {
        if let Some(path) = config.local_path() {
            std::fs::create_dir_all(path).map_err(|e| {
                StateError::Connection(format!(
                    "Failed to create database directory {}: {}",
                    path, e
                ))
            })?;
        }

        let db = surrealdb::engine::any::connect(&config.endpoint)
            .await
            .map_err(|e| {
                StateError::Connection(format!("Failed to connect to {}: {}", config.endpoint, e))
            })?;

        if let Some(creds) = &config.credentials {
            if creds.is_root {
                db.signin(Root {
                    username: &creds.username,
                    password: &creds.password,
                })
                .await
                .map_err(|e| StateError::Connection(format!("Root auth failed: {e}")))?;
            } else {
                db.signin(Database {
                    namespace: &config.namespace,
                    database: &config.database,
                    username: &creds.username,
                    password: &creds.password,
                })
                .await
                .map_err(|e| StateError::Connection(format!("DB auth failed: {e}")))?;
            }
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;

        info!("SurrealStore connected");
        Ok(Self { db })
    }

    /// Create an in-memory instance for testing.
    pub async fn in_memory() -> crate::Result<Self> {
        Self::connect(&StoreConfig::in_memory()).await
    }

    /// Connect using `StoreConfig::from_env`.
    pub async fn from_env() -> crate::Result<Self> {
        let config = StoreConfig::from_env()?;
        Self::connect(&config).await
    }

    // -- private helpers -----------------------------------------------------

    /// Next application id for `table.column` (max + 1, starting at 1).
    async fn next_id(&self, table: &str, column: &str) -> StorageResult<u64> {
        let mut res = self
            .db
            .query(format!("SELECT VALUE {column} FROM {table}"))
            .await?;
        let ids: Vec<u64> = res.take(0)?;
        Ok(ids.into_iter().max().unwrap_or(0) + 1)
    }

    async fn fetch_rule_row(&self, id: RuleId) -> StorageResult<RuleRow> {
        let mut res = self
            .db
            .query("SELECT * FROM rules WHERE rule_id = $rid")
            .bind(("rid", id.0))
            .await?;
        let rows: Vec<RuleRow> = res.take(0)?;
        rows.into_iter()
            .next()
            .ok_or(StorageError::RuleNotFound { id: id.0 })
    }

    async fn fetch_model_row(&self, id: ModelId) -> StorageResult<ModelRow> {
        let mut res = self
            .db
            .query("SELECT * FROM models WHERE model_id = $mid")
            .bind(("mid", id.0))
            .await?;
        let rows: Vec<ModelRow> = res.take(0)?;
        rows.into_iter()
            .next()
            .ok_or(StorageError::ModelNotFound { id: id.0 })
    }

    async fn fetch_essay_row(&self, id: EssayId) -> StorageResult<EssayRow> {
        let mut res = self
            .db
            .query("SELECT * FROM essays WHERE essay_id = $eid")
            .bind(("eid", id.0))
            .await?;
        let rows: Vec<EssayRow> = res.take(0)?;
        rows.into_iter()
            .next()
            .ok_or(StorageError::EssayNotFound { id: id.0 })
    }
}

#[async_trait]
impl RuleStore for SurrealStore {
    async fn fetch_rules(&self) -> StorageResult<Vec<RuleRecord>> {
        let mut res = self
            .db
            .query("SELECT * FROM rules ORDER BY rule_id ASC")
            .await?;
        let rows: Vec<RuleRow> = res.take(0)?;
        rows.into_iter().map(RuleRow::into_record).collect()
    }

    async fn insert_rule(&self, rule: NewRule) -> StorageResult<RuleId> {
        let rule_id = self.next_id("rules", "rule_id").await?;
        debug!(rule_id, kind = %rule.kind, "inserting rule");

        let _created: Option<RuleRow> = self
            .db
            .create("rules")
            .content(RuleRow::new(rule_id, rule))
            .await?;

        Ok(RuleId(rule_id))
    }

    async fn fetch_rule(&self, id: RuleId) -> StorageResult<RuleRecord> {
        self.fetch_rule_row(id).await?.into_record()
    }

    async fn update_rule(&self, id: RuleId, patch: RulePatch) -> StorageResult<RuleRecord> {
        let mut row = self.fetch_rule_row(id).await?;
        if let Some(name) = patch.name {
            row.name = name;
        }
        if let Some(description) = patch.description {
            row.description = description;
        }
        if let Some(parameters) = patch.parameters {
            row.parameters = parameters.into_value();
        }

        debug!(rule_id = id.0, "updating rule");
        self.db
            .query(
                "UPDATE rules SET name = $name, description = $description, \
                 parameters = $parameters WHERE rule_id = $rid",
            )
            .bind(("name", row.name.clone()))
            .bind(("description", row.description.clone()))
            .bind(("parameters", row.parameters.clone()))
            .bind(("rid", id.0))
            .await?
            .check()?;

        row.into_record()
    }

    async fn delete_rule(&self, id: RuleId) -> StorageResult<()> {
        self.fetch_rule_row(id).await?;
        self.db
            .query("DELETE rules WHERE rule_id = $rid")
            .bind(("rid", id.0))
            .await?
            .check()?;
        Ok(())
    }

    async fn count_rules(&self) -> StorageResult<u64> {
        let mut res = self
            .db
            .query("SELECT count() AS count FROM rules GROUP ALL")
            .await?;
        let rows: Vec<CountRow> = res.take(0)?;
        Ok(rows.first().map(|r| r.count).unwrap_or(0))
    }
}

#[async_trait]
impl ModelStore for SurrealStore {
    async fn create_model(
        &self,
        name: &str,
        description: &str,
        parameters: ParameterBag,
    ) -> StorageResult<ModelId> {
        let model_id = self.next_id("models", "model_id").await?;
        debug!(model_id, name, "creating model");

        let _created: Option<ModelRow> = self
            .db
            .create("models")
            .content(ModelRow::new(model_id, name, description, parameters))
            .await?;

        Ok(ModelId(model_id))
    }

    async fn get_model(&self, id: ModelId) -> StorageResult<ModelRecord> {
        self.fetch_model_row(id).await?.into_record()
    }

    async fn list_models(&self) -> StorageResult<Vec<ModelRecord>> {
        let mut res = self
            .db
            .query("SELECT * FROM models ORDER BY model_id ASC")
            .await?;
        let rows: Vec<ModelRow> = res.take(0)?;
        rows.into_iter().map(ModelRow::into_record).collect()
    }

    async fn update_model_parameters(
        &self,
        id: ModelId,
        parameters: ParameterBag,
    ) -> StorageResult<ModelRecord> {
        let mut row = self.fetch_model_row(id).await?;
        row.parameters = parameters.into_value();

        self.db
            .query("UPDATE models SET parameters = $parameters WHERE model_id = $mid")
            .bind(("parameters", row.parameters.clone()))
            .bind(("mid", id.0))
            .await?
            .check()?;

        row.into_record()
    }
}

/// Record key of one essay version; doubles as its uniqueness constraint.
fn version_key(essay_id: EssayId, version: u32) -> String {
    format!("{}_{}", essay_id.0, version)
}

#[async_trait]
impl EssayStore for SurrealStore {
    async fn find_essay(
        &self,
        student: &str,
        model_id: ModelId,
        title: &str,
    ) -> StorageResult<Option<EssayRecord>> {
        let mut res = self
            .db
            .query(
                "SELECT * FROM essays WHERE student = $student AND model_id = $mid \
                 AND title = $title",
            )
            .bind(("student", student.to_string()))
            .bind(("mid", model_id.0))
            .bind(("title", title.to_string()))
            .await?;
        let rows: Vec<EssayRow> = res.take(0)?;
        Ok(rows.into_iter().next().map(EssayRow::into_record))
    }

    async fn find_or_create_essay(
        &self,
        student: &str,
        model_id: ModelId,
        title: &str,
    ) -> StorageResult<EssayRecord> {
        if let Some(existing) = self.find_essay(student, model_id, title).await? {
            return Ok(existing);
        }

        let essay_id = self.next_id("essays", "essay_id").await?;
        debug!(essay_id, student, title, "creating essay");

        let row = EssayRow::new(essay_id, student, model_id, title);
        let _created: Option<EssayRow> = self.db.create("essays").content(row.clone()).await?;

        Ok(row.into_record())
    }

    async fn get_essay(&self, id: EssayId) -> StorageResult<EssayRecord> {
        Ok(self.fetch_essay_row(id).await?.into_record())
    }

    async fn append_version(&self, essay_id: EssayId, text: &str) -> StorageResult<EssayVersion> {
        self.fetch_essay_row(essay_id).await?;

        let mut res = self
            .db
            .query("SELECT VALUE version FROM essay_versions WHERE essay_id = $eid")
            .bind(("eid", essay_id.0))
            .await?;
        let existing: Vec<u32> = res.take(0)?;
        let next = existing.into_iter().max().unwrap_or(0) + 1;

        debug!(essay_id = essay_id.0, version = next, "appending essay version");

        let row = EssayVersionRow::new(essay_id, next, text);
        let _created: Option<EssayVersionRow> = self
            .db
            .create(("essay_versions", version_key(essay_id, next)))
            .content(row.clone())
            .await?;

        row.into_version()
    }

    async fn list_versions(&self, essay_id: EssayId) -> StorageResult<Vec<EssayVersion>> {
        self.fetch_essay_row(essay_id).await?;

        let mut res = self
            .db
            .query("SELECT * FROM essay_versions WHERE essay_id = $eid ORDER BY version ASC")
            .bind(("eid", essay_id.0))
            .await?;
        let rows: Vec<EssayVersionRow> = res.take(0)?;
        rows.into_iter().map(EssayVersionRow::into_version).collect()
    }

    async fn delete_essay(&self, id: EssayId) -> StorageResult<()> {
        self.fetch_essay_row(id).await?;
        debug!(essay_id = id.0, "deleting essay");
        self.db
            .query("DELETE essay_versions WHERE essay_id = $eid; DELETE essays WHERE essay_id = $eid")
            .bind(("eid", id.0))
            .await?
            .check()?;
        Ok(())
    }
}
