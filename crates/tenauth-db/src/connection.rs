//! Store bootstrap: open the SurrealDB endpoint, select the tenauth
//! namespace, bring the schema up to date and hand out repositories.
//!
//! The endpoint scheme picks the engine (`ws://` / `wss://` for a
//! server, `mem://` for the embedded engine when the `kv-mem` feature
//! of `surrealdb` is enabled).

use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::repository::{SurrealSessionRepository, SurrealTenantRepository, SurrealUserRepository};
use crate::schema::run_migrations;

/// Root credentials for a SurrealDB server.
#[derive(Debug, Clone)]
pub struct DbCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Endpoint URL, e.g. `ws://127.0.0.1:8000` or `mem://`.
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    /// Omitted for the embedded engine, which has no users.
    pub credentials: Option<DbCredentials>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8000".into(),
            namespace: "tenauth".into(),
            database: "auth".into(),
            credentials: Some(DbCredentials {
                username: "root".into(),
                password: "root".into(),
            }),
        }
    }
}

impl DbConfig {
    /// Embedded in-process store, e.g. for tests and single-node setups.
    pub fn in_memory() -> Self {
        Self {
            endpoint: "mem://".into(),
            credentials: None,
            ..Self::default()
        }
    }
}

/// A migrated connection shared by the tenant, user and session
/// repositories.
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
            "opening credential store"
        );

        let db = any::connect(config.endpoint.as_str())
            .await
            .map_err(|source| DbError::Connect {
                endpoint: config.endpoint.clone(),
                source,
            })?;

        if let Some(credentials) = &config.credentials {
            db.signin(Root {
                username: credentials.username.clone(),
                password: credentials.password.clone(),
            })
            .await
            .map_err(|source| DbError::SignIn {
                username: credentials.username.clone(),
                source,
            })?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;
        run_migrations(&db).await?;

        info!("credential store ready");
        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<Any> {
        &self.db
    }

    pub fn tenants(&self) -> SurrealTenantRepository<Any> {
        SurrealTenantRepository::new(self.db.clone())
    }

    pub fn users(&self) -> SurrealUserRepository<Any> {
        SurrealUserRepository::new(self.db.clone())
    }

    pub fn sessions(&self) -> SurrealSessionRepository<Any> {
        SurrealSessionRepository::new(self.db.clone())
    }
}
