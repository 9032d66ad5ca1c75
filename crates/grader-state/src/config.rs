//! Store configuration
//!
//! Where the SurrealDB store lives and how to authenticate against it.

use crate::error::StateError;

/// Default on-disk location used when no endpoint is configured.
pub const DEFAULT_LOCAL_PATH: &str = ".essay-grader/db";

const DEFAULT_NAMESPACE: &str = "essay_grader";
const DEFAULT_DATABASE: &str = "main";

/// Credentials for a remote SurrealDB endpoint
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Whether this is a root user (true) or database user (false)
    pub is_root: bool,
}

/// Configuration for connecting the store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Connection URL: `mem://`, `surrealkv://<path>`, `ws://..` or `wss://..`
    pub endpoint: String,
    /// Namespace (default: "essay_grader")
    pub namespace: String,
    /// Database name (default: "main")
    pub database: String,
    /// Credentials, required only for remote endpoints
    pub credentials: Option<Credentials>,
}

impl StoreConfig {
    /// Create a configuration for an arbitrary endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            credentials: None,
        }
    }

    /// Volatile in-memory store
    pub fn in_memory() -> Self {
        Self::new("mem://")
    }

    /// Embedded on-disk store at `path`
    pub fn local(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(format!("surrealkv://{}", path.as_ref().display()))
    }

    /// Set custom namespace
    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    /// Set custom database
    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = db.into();
        self
    }

    /// Attach credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        is_root: bool,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
            is_root,
        });
        self
    }

    /// Path of the embedded store, if this is a `surrealkv://` endpoint
    pub fn local_path(&self) -> Option<&str> {
        self.endpoint.strip_prefix("surrealkv://")
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - GRADER_DB_URL (optional, default: `surrealkv://.essay-grader/db`)
    /// - GRADER_DB_NAMESPACE (optional, default: "essay_grader")
    /// - GRADER_DB_DATABASE (optional, default: "main")
    /// - GRADER_DB_USERNAME / GRADER_DB_PASSWORD (optional, both or neither)
    /// - GRADER_DB_ROOT (optional, default: "false")
    pub fn from_env() -> Result<Self, StateError> {
        let endpoint = std::env::var("GRADER_DB_URL")
            .unwrap_or_else(|_| format!("surrealkv://{DEFAULT_LOCAL_PATH}"));
        let mut config = Self::new(endpoint);

        if let Ok(ns) = std::env::var("GRADER_DB_NAMESPACE") {
            config = config.with_namespace(ns);
        }
        if let Ok(db) = std::env::var("GRADER_DB_DATABASE") {
            config = config.with_database(db);
        }

        let username = std::env::var("GRADER_DB_USERNAME").ok();
        let password = std::env::var("GRADER_DB_PASSWORD").ok();
        match (username, password) {
            (Some(u), Some(p)) => {
                let is_root = std::env::var("GRADER_DB_ROOT")
                    .map(|v| v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false);
                config = config.with_credentials(u, p, is_root);
            }
            (None, None) => {}
            _ => {
                return Err(StateError::Config(
                    "GRADER_DB_USERNAME and GRADER_DB_PASSWORD must be set together".to_string(),
                ))
            }
        }

        Ok(config)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::local(DEFAULT_LOCAL_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_config_points_at_surrealkv() {
        let config = StoreConfig::local("/tmp/grader");
        assert_eq!(config.endpoint, "surrealkv:///tmp/grader");
        assert_eq!(config.local_path(), Some("/tmp/grader"));
        assert_eq!(config.namespace, "essay_grader");
    }

    #[test]
    fn in_memory_config_has_no_local_path() {
        let config = StoreConfig::in_memory().with_database("tests");
        assert_eq!(config.local_path(), None);
        assert_eq!(config.database, "tests");
        assert!(config.credentials.is_none());
    }
}
