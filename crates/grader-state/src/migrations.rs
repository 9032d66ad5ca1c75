//! SurrealDB schema migrations and initialization
//!
//! This module provides initialization functions to set up all tables
//! with their indexes and uniqueness constraints.

use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Initialize all essay grader tables in SurrealDB
///
/// This should be called once on first connection to set up the schema.
/// Safe to call multiple times (idempotent).
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing essay grader SurrealDB schema");

    init_rules_table(db).await?;
    init_models_table(db).await?;
    init_essays_table(db).await?;
    init_essay_versions_table(db).await?;

    info!("Essay grader schema initialization complete");
    Ok(())
}

/// Initialize `rules` table
///
/// Schema:
/// ```text
/// TABLE rules {
///   rule_id:      INT (unique, assigned max + 1)
///   name:         STRING
///   description:  STRING
///   kind:         STRING (rule kind key)
///   parameters:   OBJECT
///   created_at:   DATETIME
/// }
/// ```
///
/// Constraints:
/// - `rule_id` is unique
/// - names are not unique at this layer; seeding is idempotent by app logic
async fn init_rules_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing rules table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS rules SCHEMALESS
            PERMISSIONS FOR select, create, update, delete FULL;

        DEFINE INDEX IF NOT EXISTS idx_rule_id ON TABLE rules COLUMNS rule_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_rule_kind ON TABLE rules COLUMNS kind;
    "#;

    db.query(sql).await?.check()?;
    info!("✓ rules table initialized");
    Ok(())
}

/// Initialize `models` table
///
/// Schema:
/// ```text
/// TABLE models {
///   model_id:     INT (unique)
///   name:         STRING
///   description:  STRING
///   parameters:   OBJECT (per-kind overrides)
///   created_at:   DATETIME
/// }
/// ```
async fn init_models_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing models table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS models SCHEMALESS
            PERMISSIONS
                FOR select, create, update FULL
                FOR delete NONE;

        DEFINE INDEX IF NOT EXISTS idx_model_id ON TABLE models COLUMNS model_id UNIQUE;
    "#;

    db.query(sql).await?.check()?;
    info!("✓ models table initialized");
    Ok(())
}

/// Initialize `essays` table
///
/// Schema:
/// ```text
/// TABLE essays {
///   essay_id:    INT (unique)
///   student:     STRING
///   model_id:    INT (models.model_id)
///   title:       STRING
///   created_at:  DATETIME
/// }
/// ```
///
/// Constraints:
/// - `(student, model_id, title)` is unique: one essay per triple
async fn init_essays_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing essays table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS essays SCHEMALESS
            PERMISSIONS
                FOR select, create, delete FULL
                FOR update NONE;

        DEFINE INDEX IF NOT EXISTS idx_essay_id ON TABLE essays COLUMNS essay_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_essay_identity ON TABLE essays COLUMNS student, model_id, title UNIQUE;
    "#;

    db.query(sql).await?.check()?;
    info!("✓ essays table initialized");
    Ok(())
}

/// Initialize `essay_versions` table
///
/// Schema:
/// ```text
/// TABLE essay_versions {
///   essay_id:     INT (essays.essay_id)
///   version:      INT (1-based, monotonic per essay)
///   text:         STRING
///   text_digest:  STRING (SHA-256 of text)
///   created_at:   DATETIME
/// }
/// ```
///
/// Constraints:
/// - `(essay_id, version)` is unique: the record id is
///   `essay_versions:⟨<essay_id>_<version>⟩`, so a second create fails
/// - versions are append-only
async fn init_essay_versions_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing essay_versions table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS essay_versions SCHEMALESS
            PERMISSIONS
                FOR select, create, delete FULL
                FOR update NONE;

        DEFINE INDEX IF NOT EXISTS idx_version_essay ON TABLE essay_versions COLUMNS essay_id;
    "#;

    db.query(sql).await?.check()?;
    info!("✓ essay_versions table initialized");
    Ok(())
}
