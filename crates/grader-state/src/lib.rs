//! Grader-State: persistence layer for the essay grader
//!
//! This crate owns every byte the grader writes: rule definitions and their
//! parameter bags, grading models, essays and essay versions.
//!
//! ## Key Components
//!
//! - `storage_traits`: backend-agnostic async contracts (`RuleStore`,
//!   `ModelStore`, `EssayStore`)
//! - `fakes`: in-memory implementations for tests
//! - `SurrealStore`: SurrealDB implementation (memory, embedded or remote)
//! - `StoreConfig`: where the store lives

mod config;
mod error;
pub mod fakes;
pub mod migrations;
pub mod schema;
pub mod storage_traits;
mod surreal_store;

pub use config::{Credentials, StoreConfig, DEFAULT_LOCAL_PATH};
pub use error::{StateError, StorageError};
pub use storage_traits::{
    ContentDigest, EssayId, EssayRecord, EssayStore, EssayVersion, ModelId, ModelRecord,
    ModelStore, NewRule, ParameterBag, RuleId, RuleKind, RulePatch, RuleRecord, RuleStore,
    StorageResult,
};
pub use surreal_store::SurrealStore;

/// Result type for grader-state operations
pub type Result<T> = std::result::Result<T, StateError>;
