//! SurrealDB connection management.
//!
//! The endpoint scheme selects the engine: `ws://` or `wss://` reach a
//! remote server with root credentials, `mem://` opens an embedded
//! in-memory store that has no users to sign in as.

use roadease_core::error::AppResult;
use roadease_core::repository::PermissionRepository;
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::repository::SurrealPermissionRepository;
use crate::schema::run_migrations;

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Engine URL, e.g. `ws://127.0.0.1:8000` or `mem://`.
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    /// Ignored for embedded endpoints.
    pub username: String,
    pub password: String,
}

impl DbConfig {
    fn is_embedded(&self) -> bool {
        self.endpoint.starts_with("mem://")
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8000".into(),
            namespace: "roadease".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// Handle to the ROAD EASE store.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Any>,
}

impl DbManager {
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            endpoint = %config.endpoint,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = any::connect(config.endpoint.as_str()).await?;

        if !config.is_embedded() {
            db.signin(Root {
                username: config.username.clone(),
                password: config.password.clone(),
            })
            .await?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!(embedded = config.is_embedded(), "Connected to SurrealDB");
        Ok(Self { db })
    }

    /// Apply pending migrations and make sure the permission catalog is
    /// present. Safe to run on every start. Returns the catalog size.
    pub async fn prepare(&self) -> AppResult<u64> {
        run_migrations(&self.db).await?;
        SurrealPermissionRepository::new(self.db.clone())
            .seed_catalog()
            .await
    }

    pub fn client(&self) -> &Surreal<Any> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_mem_endpoints_are_embedded() {
        let remote = DbConfig::default();
        assert!(!remote.is_embedded());

        let local = DbConfig {
            endpoint: "mem://".into(),
            ..Default::default()
        };
        assert!(local.is_embedded());
    }
}
