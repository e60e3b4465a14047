//! Store connection.
//!
//! The endpoint picks the engine: `ws://host:port` (or a bare `host:port`)
//! reaches a SurrealDB server, `mem://` opens an in-process store that
//! lives as long as the process. Embedded stores skip root sign-in.

use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::schema;

#[derive(Debug, Clone)]
pub struct DbConfig {
    /// `ws://`, `wss://` or `mem://` endpoint. A bare address is taken as
    /// WebSocket.
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
    /// Apply pending migrations right after connecting.
    pub migrate: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8000".into(),
            namespace: "support".into(),
            database: "portal".into(),
            username: "root".into(),
            password: "root".into(),
            migrate: false,
        }
    }
}

impl DbConfig {
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else {
            format!("ws://{}", self.endpoint)
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.endpoint_url().starts_with("mem://")
    }
}

/// An open, namespace-selected (and optionally migrated) store.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Any>,
}

impl DbManager {
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let url = config.endpoint_url();
        info!(
            endpoint = %url,
            namespace = %config.namespace,
            database = %config.database,
            "Opening support store"
        );

        let db = any::connect(url).await?;
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

        if config.migrate {
            schema::run_migrations(&db).await?;
            info!(version = schema::latest_version(), "Support store migrated");
        }

        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<Any> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_address_defaults_to_websocket() {
        let config = DbConfig {
            endpoint: "10.0.0.5:8000".into(),
            ..Default::default()
        };
        assert_eq!(config.endpoint_url(), "ws://10.0.0.5:8000");
        assert!(!config.is_embedded());
    }

    #[test]
    fn mem_endpoint_is_embedded() {
        let config = DbConfig {
            endpoint: "mem://".into(),
            ..Default::default()
        };
        assert_eq!(config.endpoint_url(), "mem://");
        assert!(config.is_embedded());
    }
}
